//! The sink contract.
//!
//! Every pipeline stage, including the channel switch itself, accepts bytes on
//! a named channel plus three kinds of signal: message end, flush and
//! message-series end. Each call reports whether the stage took everything or
//! is pushing back.

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;
use crate::error::Result;

/// Outcome of handing bytes to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Every byte was taken.
    Accepted,
    /// The sink stopped early. The trailing `remaining` bytes were not taken.
    Blocked {
        /// Length of the unconsumed suffix.
        remaining: usize,
    },
}

impl Delivery {
    /// Whether the sink pushed back.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Delivery::Blocked { .. })
    }
}

/// Outcome of sending a boundary signal to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The signal was taken.
    Accepted,
    /// The signal was not taken; send it again later.
    Blocked,
}

impl Ack {
    /// Whether the sink pushed back.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Ack::Blocked)
    }
}

/// Outcome of a flush request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStatus {
    /// Nothing was left buffered.
    AllClean,
    /// Something is still buffered; flush again later.
    HasPending,
}

impl FlushStatus {
    /// Whether nothing is left buffered.
    pub fn is_clean(&self) -> bool {
        matches!(self, FlushStatus::AllClean)
    }
}

/// How far a signal cascades through chained sinks.
///
/// `LOCAL` stops at the receiving sink; `depth(n)` lets it pass `n` further
/// hops; `UNLIMITED` goes all the way down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Propagation(Option<u32>);

impl Propagation {
    /// Cascade through every chained sink.
    pub const UNLIMITED: Self = Self(None);

    /// Stop at the receiving sink.
    pub const LOCAL: Self = Self(Some(0));

    /// Cascade through at most `hops` further sinks.
    pub const fn depth(hops: u32) -> Self {
        Self(Some(hops))
    }

    /// Remaining hops, or `None` when unlimited.
    pub const fn hops(self) -> Option<u32> {
        self.0
    }

    /// Whether the signal may travel past the receiving sink.
    pub const fn reaches_downstream(self) -> bool {
        !matches!(self.0, Some(0))
    }

    /// The propagation to hand to the next sink in a chain, if any.
    pub fn next(self) -> Option<Self> {
        match self.0 {
            None => Some(Self::UNLIMITED),
            Some(0) => None,
            Some(n) => Some(Self(Some(n - 1))),
        }
    }
}

/// A pipeline stage.
///
/// Methods take `&self`: implementations synchronise internally so the same
/// sink can sit behind several routes at once.
///
/// `blocking` tells the sink whether it may wait for room. A sink that cannot
/// wait reports `Blocked` either way.
pub trait Sink: Send + Sync {
    /// Take bytes on `channel`.
    fn accept(&self, channel: &ChannelId, data: &[u8], blocking: bool) -> Result<Delivery>;

    /// Take bytes the sink is allowed to modify in place.
    fn accept_modifiable(
        &self,
        channel: &ChannelId,
        data: &mut [u8],
        blocking: bool,
    ) -> Result<Delivery> {
        self.accept(channel, data, blocking)
    }

    /// Mark the end of the current message on `channel`.
    fn accept_message_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        blocking: bool,
    ) -> Result<Ack>;

    /// Push out buffered state. `complete` also flushes content normally held
    /// back for coalescing.
    fn flush(
        &self,
        channel: &ChannelId,
        complete: bool,
        propagation: Propagation,
        blocking: bool,
    ) -> Result<FlushStatus>;

    /// Mark that no more messages will arrive on `channel`.
    fn message_series_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        blocking: bool,
    ) -> Result<Ack>;

    /// Hand out a scratch buffer of at least `size_hint` bytes capacity that
    /// the caller fills before calling [`Sink::accept`].
    fn reserve_space(&self, _channel: &ChannelId, size_hint: usize) -> BytesMut {
        BytesMut::with_capacity(size_hint)
    }

    /// Name of the concrete sink type. Used to tell apart a sink and a field
    /// stored at the same address; implementations should not override it.
    #[doc(hidden)]
    fn sink_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Whether two sink references point at the same sink instance.
///
/// Both the data address and the concrete type must match, so a wrapper and
/// its first field are distinct. Zero-sized sinks of one type cannot be told
/// apart; see [`is_zero_sized`].
pub fn same_sink(a: &dyn Sink, b: &dyn Sink) -> bool {
    std::ptr::eq(a as *const dyn Sink as *const u8, b as *const dyn Sink as *const u8)
        && a.sink_type_name() == b.sink_type_name()
}

/// Whether `sink` occupies no memory, leaving it without a distinct address.
pub fn is_zero_sized(sink: &dyn Sink) -> bool {
    std::mem::size_of_val(sink) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySink;

    #[test]
    fn test_propagation_next() {
        assert_eq!(Propagation::UNLIMITED.next(), Some(Propagation::UNLIMITED));
        assert_eq!(Propagation::LOCAL.next(), None);
        assert_eq!(Propagation::depth(2).next(), Some(Propagation::depth(1)));
        assert_eq!(Propagation::depth(1).next(), Some(Propagation::LOCAL));
    }

    #[test]
    fn test_propagation_reach() {
        assert!(Propagation::UNLIMITED.reaches_downstream());
        assert!(Propagation::depth(3).reaches_downstream());
        assert!(!Propagation::LOCAL.reaches_downstream());
        assert_eq!(Propagation::default(), Propagation::UNLIMITED);
    }

    #[test]
    fn test_same_sink() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        assert!(same_sink(&a, &a));
        assert!(!same_sink(&a, &b));
    }

    #[test]
    fn test_wrapper_is_not_its_field() {
        #[repr(transparent)]
        struct Wrapper(MemorySink);
        impl Sink for Wrapper {
            fn accept(&self, c: &ChannelId, d: &[u8], b: bool) -> Result<Delivery> {
                self.0.accept(c, d, b)
            }
            fn accept_message_end(&self, c: &ChannelId, p: Propagation, b: bool) -> Result<Ack> {
                self.0.accept_message_end(c, p, b)
            }
            fn flush(&self, c: &ChannelId, f: bool, p: Propagation, b: bool) -> Result<FlushStatus> {
                self.0.flush(c, f, p, b)
            }
            fn message_series_end(&self, c: &ChannelId, p: Propagation, b: bool) -> Result<Ack> {
                self.0.message_series_end(c, p, b)
            }
        }

        let wrapper = Wrapper(MemorySink::new());
        assert!(std::ptr::eq(
            &wrapper as *const Wrapper as *const u8,
            &wrapper.0 as *const MemorySink as *const u8
        ));
        assert!(!same_sink(&wrapper, &wrapper.0));
        assert!(same_sink(&wrapper, &wrapper));
        assert!(!is_zero_sized(&wrapper));
    }

    #[test]
    fn test_default_reserve_space() {
        let sink = MemorySink::new();
        let buf = sink.reserve_space(&ChannelId::DEFAULT, 64);
        assert!(buf.capacity() >= 64);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(Delivery::Blocked { remaining: 3 }.is_blocked());
        assert!(!Delivery::Accepted.is_blocked());
        assert!(Ack::Blocked.is_blocked());
        assert!(FlushStatus::AllClean.is_clean());
        assert!(!FlushStatus::HasPending.is_clean());
    }
}
