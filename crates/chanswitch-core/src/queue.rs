//! Bounded queue sink.
//!
//! A producer/consumer hand-off over a bounded `tokio::sync::mpsc` channel.
//! The budget counts queued items: data is split into chunks of at most
//! `chunk_size` bytes and each chunk, like each signal, takes one slot. When
//! every slot is taken a blocking producer parks until the consumer frees one;
//! a non-blocking producer gets `Blocked` with the untaken suffix.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::channel::ChannelId;
use crate::error::{Result, SinkError};
use crate::sink::{Ack, Delivery, FlushStatus, Propagation, Sink};

/// An item waiting in a [`QueueSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    /// A chunk of bytes.
    Data { channel: ChannelId, bytes: Vec<u8> },
    /// End of a message.
    MessageEnd { channel: ChannelId },
    /// End of the message series.
    SeriesEnd { channel: ChannelId },
}

/// Bounded sink whose producers can genuinely wait for room.
///
/// Blocking calls use `blocking_send`/`blocking_recv` and panic when made
/// from inside an async runtime; drive a queue from async code with
/// `blocking = false`.
pub struct QueueSink {
    slots: usize,
    chunk_size: usize,
    /// `None` once closed.
    sender: Mutex<Option<mpsc::Sender<QueueItem>>>,
    receiver: Mutex<mpsc::Receiver<QueueItem>>,
    /// Items sent and not yet received.
    queued: AtomicUsize,
}

impl QueueSink {
    /// Create a queue holding at most `slots` items.
    ///
    /// A zero budget is raised to one so progress is always possible. Data is
    /// not split unless [`QueueSink::with_chunk_size`] is used.
    pub fn new(slots: usize) -> Self {
        let slots = slots.max(1);
        let (sender, receiver) = mpsc::channel(slots);
        Self {
            slots,
            chunk_size: usize::MAX,
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
            queued: AtomicUsize::new(0),
        }
    }

    /// Split accepted data into chunks of at most `bytes` bytes.
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Item budget.
    pub fn capacity(&self) -> usize {
        self.slots
    }

    /// Largest data chunk queued as one item.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the oldest item without waiting.
    pub fn pop(&self) -> Option<QueueItem> {
        let item = self.receiver().try_recv().ok()?;
        self.queued.fetch_sub(1, Ordering::AcqRel);
        Some(item)
    }

    /// Take the oldest item, waiting for one to arrive.
    ///
    /// Returns `None` once the queue is closed and drained.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async runtime.
    pub fn recv_blocking(&self) -> Option<QueueItem> {
        let item = self.receiver().blocking_recv()?;
        self.queued.fetch_sub(1, Ordering::AcqRel);
        Some(item)
    }

    /// Take everything currently queued.
    pub fn drain(&self) -> Vec<QueueItem> {
        std::iter::from_fn(|| self.pop()).collect()
    }

    /// Close the queue. Later calls fail with [`SinkError::Closed`]; items
    /// already queued can still be taken.
    pub fn close(&self) {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        // A consumer parked in `recv_blocking` holds the receiver; it wakes
        // on its own once the last in-flight sender finishes.
        let receiver = match self.receiver.try_lock() {
            Ok(receiver) => Some(receiver),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };
        if let Some(mut receiver) = receiver {
            receiver.close();
        }
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn sender(&self) -> Result<mpsc::Sender<QueueItem>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SinkError::Closed)
    }

    fn receiver(&self) -> MutexGuard<'_, mpsc::Receiver<QueueItem>> {
        self.receiver.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue one item. `Ok(false)` means the queue is full.
    fn send(
        &self,
        sender: &mpsc::Sender<QueueItem>,
        item: QueueItem,
        blocking: bool,
    ) -> Result<bool> {
        // Counted before sending so a fast consumer never underflows it.
        self.queued.fetch_add(1, Ordering::AcqRel);
        let sent = if blocking {
            if sender.capacity() == 0 {
                tracing::trace!("queue full, waiting for consumer");
            }
            sender
                .blocking_send(item)
                .map(|()| true)
                .map_err(|_| SinkError::Closed)
        } else {
            match sender.try_send(item) {
                Ok(()) => Ok(true),
                Err(TrySendError::Full(_)) => Ok(false),
                Err(TrySendError::Closed(_)) => Err(SinkError::Closed),
            }
        };
        if !matches!(sent, Ok(true)) {
            self.queued.fetch_sub(1, Ordering::AcqRel);
        }
        sent
    }

    fn push_signal(&self, item: QueueItem, blocking: bool) -> Result<Ack> {
        let sender = self.sender()?;
        if self.send(&sender, item, blocking)? {
            Ok(Ack::Accepted)
        } else {
            Ok(Ack::Blocked)
        }
    }
}

impl Sink for QueueSink {
    fn accept(&self, channel: &ChannelId, data: &[u8], blocking: bool) -> Result<Delivery> {
        let sender = self.sender()?;
        let mut taken = 0;

        for chunk in data.chunks(self.chunk_size) {
            let item = QueueItem::Data {
                channel: channel.clone(),
                bytes: chunk.to_vec(),
            };
            match self.send(&sender, item, blocking) {
                Ok(true) => taken += chunk.len(),
                Ok(false) => {
                    return Ok(Delivery::Blocked {
                        remaining: data.len() - taken,
                    })
                }
                // Report what was queued before the close; the next call fails.
                Err(SinkError::Closed) if taken > 0 => {
                    return Ok(Delivery::Blocked {
                        remaining: data.len() - taken,
                    })
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Delivery::Accepted)
    }

    fn accept_message_end(
        &self,
        channel: &ChannelId,
        _propagation: Propagation,
        blocking: bool,
    ) -> Result<Ack> {
        self.push_signal(
            QueueItem::MessageEnd {
                channel: channel.clone(),
            },
            blocking,
        )
    }

    fn flush(
        &self,
        _channel: &ChannelId,
        _complete: bool,
        _propagation: Propagation,
        _blocking: bool,
    ) -> Result<FlushStatus> {
        if self.is_empty() {
            Ok(FlushStatus::AllClean)
        } else {
            Ok(FlushStatus::HasPending)
        }
    }

    fn message_series_end(
        &self,
        channel: &ChannelId,
        _propagation: Propagation,
        blocking: bool,
    ) -> Result<Ack> {
        self.push_signal(
            QueueItem::SeriesEnd {
                channel: channel.clone(),
            },
            blocking,
        )
    }
}
