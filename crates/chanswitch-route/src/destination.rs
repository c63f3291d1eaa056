//! Route destinations.

use std::fmt;

use chanswitch_core::{same_sink, ChannelId, Sink};

/// A sink plus the output channel routed to it.
///
/// Holds a borrowed, non-owning reference: the sink must outlive every table
/// the destination sits in, and dropping the destination never touches the
/// sink.
///
/// Two destinations are equal iff they reference the same sink instance and
/// name the same output channel.
#[derive(Clone)]
pub struct Destination<'a> {
    sink: &'a dyn Sink,
    channel: ChannelId,
}

impl<'a> Destination<'a> {
    /// Create a destination.
    pub fn new(sink: &'a dyn Sink, channel: ChannelId) -> Self {
        Self { sink, channel }
    }

    /// The referenced sink.
    pub fn sink(&self) -> &'a dyn Sink {
        self.sink
    }

    /// The output channel used on the sink.
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Whether this destination references `sink`.
    pub fn targets(&self, sink: &dyn Sink) -> bool {
        same_sink(self.sink, sink)
    }
}

impl<'b> PartialEq<Destination<'b>> for Destination<'_> {
    fn eq(&self, other: &Destination<'b>) -> bool {
        same_sink(self.sink, other.sink) && self.channel == other.channel
    }
}

impl Eq for Destination<'_> {}

impl fmt::Debug for Destination<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("sink", &(self.sink as *const dyn Sink as *const u8))
            .field("channel", &self.channel)
            .finish()
    }
}
