//! In-memory implementation of the Sink trait.
//!
//! Records every call it accepts, in order. Backpressure can be scripted so
//! tests can drive a fan-out into the blocked state and back out again.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::channel::ChannelId;
use crate::error::Result;
use crate::sink::{Ack, Delivery, FlushStatus, Propagation, Sink};

/// Something a [`MemorySink`] accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// Bytes taken on a channel.
    Data { channel: ChannelId, bytes: Vec<u8> },
    /// A message-end signal.
    MessageEnd {
        channel: ChannelId,
        propagation: Propagation,
    },
    /// A flush that reported clean.
    Flush {
        channel: ChannelId,
        complete: bool,
        propagation: Propagation,
    },
    /// A message-series-end signal.
    SeriesEnd {
        channel: ChannelId,
        propagation: Propagation,
    },
}

impl SinkEvent {
    /// The channel this event arrived on.
    pub fn channel(&self) -> &ChannelId {
        match self {
            SinkEvent::Data { channel, .. }
            | SinkEvent::MessageEnd { channel, .. }
            | SinkEvent::Flush { channel, .. }
            | SinkEvent::SeriesEnd { channel, .. } => channel,
        }
    }
}

/// Recording sink with scripted backpressure.
///
/// All data is lost when the sink is dropped. Thread-safe via Mutex.
pub struct MemorySink {
    inner: Mutex<MemorySinkInner>,
}

#[derive(Default)]
struct MemorySinkInner {
    /// Accepted calls, in order.
    events: Vec<SinkEvent>,

    /// Number of upcoming calls (of any kind) to refuse outright.
    stalls: u32,

    /// Bytes still accepted before pushing back. `None` = unlimited.
    credit: Option<usize>,

    /// Number of upcoming flushes that report pending state.
    pending_flushes: u32,

    /// Total calls seen, including refused ones.
    calls: usize,
}

impl MemorySink {
    /// Create a sink that accepts everything.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemorySinkInner::default()),
        }
    }

    /// Create a sink that takes at most `credit` bytes before pushing back.
    pub fn with_credit(credit: usize) -> Self {
        let sink = Self::new();
        sink.lock().credit = Some(credit);
        sink
    }

    /// Refuse the next `count` calls of any kind.
    pub fn stall(&self, count: u32) {
        self.lock().stalls += count;
    }

    /// Allow `bytes` more bytes through a credit-limited sink.
    pub fn grant(&self, bytes: usize) {
        let mut inner = self.lock();
        if let Some(credit) = inner.credit.as_mut() {
            *credit += bytes;
        }
    }

    /// Lift any byte limit.
    pub fn unlimit(&self) {
        self.lock().credit = None;
    }

    /// Report pending state on the next `count` flushes.
    pub fn hold_flushes(&self, count: u32) {
        self.lock().pending_flushes += count;
    }

    /// Every accepted call, in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().events.clone()
    }

    /// All bytes accepted on `channel`, concatenated.
    pub fn data(&self, channel: &ChannelId) -> Vec<u8> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Data { channel: c, bytes } if c == channel => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Total bytes accepted on any channel.
    pub fn total_bytes(&self) -> usize {
        self.lock()
            .events
            .iter()
            .map(|event| match event {
                SinkEvent::Data { bytes, .. } => bytes.len(),
                _ => 0,
            })
            .sum()
    }

    /// Number of message-end signals accepted on `channel`.
    pub fn message_ends(&self, channel: &ChannelId) -> usize {
        self.count(|event| matches!(event, SinkEvent::MessageEnd { channel: c, .. } if c == channel))
    }

    /// Number of message-series-end signals accepted on `channel`.
    pub fn series_ends(&self, channel: &ChannelId) -> usize {
        self.count(|event| matches!(event, SinkEvent::SeriesEnd { channel: c, .. } if c == channel))
    }

    /// Number of clean flushes on `channel`.
    pub fn flushes(&self, channel: &ChannelId) -> usize {
        self.count(|event| matches!(event, SinkEvent::Flush { channel: c, .. } if c == channel))
    }

    /// Whether nothing has been accepted.
    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Total calls seen, including refused ones.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.lock().events.clear();
    }

    fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.lock().events.iter().filter(|event| pred(event)).count()
    }

    fn lock(&self) -> MutexGuard<'_, MemorySinkInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySinkInner {
    /// Count the call and consume one stall if any are scheduled.
    fn stalled(&mut self) -> bool {
        self.calls += 1;
        if self.stalls > 0 {
            self.stalls -= 1;
            return true;
        }
        false
    }
}

impl Sink for MemorySink {
    fn accept(&self, channel: &ChannelId, data: &[u8], _blocking: bool) -> Result<Delivery> {
        let mut inner = self.lock();
        if inner.stalled() {
            return Ok(Delivery::Blocked {
                remaining: data.len(),
            });
        }

        let take = match inner.credit {
            Some(credit) => credit.min(data.len()),
            None => data.len(),
        };
        if let Some(credit) = inner.credit.as_mut() {
            *credit -= take;
        }
        if take > 0 {
            inner.events.push(SinkEvent::Data {
                channel: channel.clone(),
                bytes: data[..take].to_vec(),
            });
        }

        if take < data.len() {
            Ok(Delivery::Blocked {
                remaining: data.len() - take,
            })
        } else {
            Ok(Delivery::Accepted)
        }
    }

    fn accept_message_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        _blocking: bool,
    ) -> Result<Ack> {
        let mut inner = self.lock();
        if inner.stalled() {
            return Ok(Ack::Blocked);
        }
        inner.events.push(SinkEvent::MessageEnd {
            channel: channel.clone(),
            propagation,
        });
        Ok(Ack::Accepted)
    }

    fn flush(
        &self,
        channel: &ChannelId,
        complete: bool,
        propagation: Propagation,
        _blocking: bool,
    ) -> Result<FlushStatus> {
        let mut inner = self.lock();
        if inner.stalled() {
            return Ok(FlushStatus::HasPending);
        }
        if inner.pending_flushes > 0 {
            inner.pending_flushes -= 1;
            return Ok(FlushStatus::HasPending);
        }
        inner.events.push(SinkEvent::Flush {
            channel: channel.clone(),
            complete,
            propagation,
        });
        Ok(FlushStatus::AllClean)
    }

    fn message_series_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        _blocking: bool,
    ) -> Result<Ack> {
        let mut inner = self.lock();
        if inner.stalled() {
            return Ok(Ack::Blocked);
        }
        inner.events.push(SinkEvent::SeriesEnd {
            channel: channel.clone(),
            propagation,
        });
        Ok(Ack::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(name: &str) -> ChannelId {
        ChannelId::from(name)
    }

    #[test]
    fn test_records_in_order() {
        let sink = MemorySink::new();
        sink.accept(&ch("a"), b"he", false).unwrap();
        sink.accept(&ch("a"), b"llo", false).unwrap();
        sink.accept_message_end(&ch("a"), Propagation::UNLIMITED, false)
            .unwrap();

        assert_eq!(sink.data(&ch("a")), b"hello");
        assert_eq!(sink.message_ends(&ch("a")), 1);
        assert_eq!(sink.events().len(), 3);
        assert!(sink.data(&ch("b")).is_empty());
    }

    #[test]
    fn test_stall_refuses_without_recording() {
        let sink = MemorySink::new();
        sink.stall(2);

        assert_eq!(
            sink.accept(&ch("a"), b"xyz", true).unwrap(),
            Delivery::Blocked { remaining: 3 }
        );
        assert_eq!(
            sink.message_series_end(&ch("a"), Propagation::LOCAL, true)
                .unwrap(),
            Ack::Blocked
        );
        assert!(sink.is_empty());
        assert_eq!(sink.calls(), 2);

        assert_eq!(sink.accept(&ch("a"), b"xyz", true).unwrap(), Delivery::Accepted);
        assert_eq!(sink.data(&ch("a")), b"xyz");
    }

    #[test]
    fn test_credit_partial_accept() {
        let sink = MemorySink::with_credit(2);
        assert_eq!(
            sink.accept(&ch("a"), b"hello", false).unwrap(),
            Delivery::Blocked { remaining: 3 }
        );
        assert_eq!(sink.data(&ch("a")), b"he");

        sink.grant(10);
        assert_eq!(sink.accept(&ch("a"), b"llo", false).unwrap(), Delivery::Accepted);
        assert_eq!(sink.data(&ch("a")), b"hello");
    }

    #[test]
    fn test_held_flush() {
        let sink = MemorySink::new();
        sink.hold_flushes(1);
        assert_eq!(
            sink.flush(&ch("a"), true, Propagation::UNLIMITED, false)
                .unwrap(),
            FlushStatus::HasPending
        );
        assert_eq!(sink.flushes(&ch("a")), 0);
        assert_eq!(
            sink.flush(&ch("a"), true, Propagation::UNLIMITED, false)
                .unwrap(),
            FlushStatus::AllClean
        );
        assert_eq!(sink.flushes(&ch("a")), 1);
    }

    #[test]
    fn test_clear() {
        let sink = MemorySink::new();
        sink.accept(&ch(""), b"x", false).unwrap();
        sink.clear();
        assert!(sink.is_empty());
        assert_eq!(sink.total_bytes(), 0);
    }
}
