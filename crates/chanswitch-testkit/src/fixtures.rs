//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use chanswitch::{ChannelSwitch, Insertion};
use chanswitch_core::{ChannelId, MemorySink};

use crate::generators::RouteOp;

/// A fixed set of recording sinks to route to.
pub struct SinkBank {
    sinks: Vec<MemorySink>,
}

impl SinkBank {
    /// Create `count` empty sinks.
    pub fn new(count: usize) -> Self {
        Self {
            sinks: (0..count).map(|_| MemorySink::new()).collect(),
        }
    }

    /// Create sinks that each take at most `credit` bytes before pushing back.
    pub fn with_credit(count: usize, credit: usize) -> Self {
        Self {
            sinks: (0..count).map(|_| MemorySink::with_credit(credit)).collect(),
        }
    }

    /// The sink at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn sink(&self, index: usize) -> &MemorySink {
        &self.sinks[index]
    }

    pub fn sinks(&self) -> &[MemorySink] {
        &self.sinks
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Index of the sink a destination on the switch points at.
    pub fn index_of(&self, sink: &dyn chanswitch_core::Sink) -> Option<usize> {
        self.sinks
            .iter()
            .position(|s| chanswitch_core::same_sink(s, sink))
    }

    /// Refuse the next `stalls[i]` calls on sink `i`.
    pub fn stall(&self, stalls: &[u32]) {
        for (sink, &count) in self.sinks.iter().zip(stalls) {
            sink.stall(count);
        }
    }

    /// Lift the byte limit on every sink.
    pub fn unlimit(&self) {
        for sink in &self.sinks {
            sink.unlimit();
        }
    }

    /// Forget everything every sink recorded.
    pub fn clear(&self) {
        for sink in &self.sinks {
            sink.clear();
        }
    }

    /// A switch routing `input` to every sink in the bank on `output`.
    pub fn fan_out(&self, input: &str, output: &str) -> chanswitch::Result<ChannelSwitch<'_>> {
        let switch = ChannelSwitch::new();
        for sink in &self.sinks {
            switch.add_route(input, sink, output)?;
        }
        Ok(switch)
    }

    /// Replay a route mutation onto `switch`.
    pub fn apply<'a>(
        &'a self,
        switch: &ChannelSwitch<'a>,
        op: &RouteOp,
    ) -> chanswitch::Result<Option<Insertion>> {
        match op {
            RouteOp::Add {
                input: Some(input),
                sink,
                output,
            } => switch
                .add_route(input, self.sink(*sink), output)
                .map(Some),
            RouteOp::Add {
                input: None,
                sink,
                output,
            } => switch
                .add_default_route_on(self.sink(*sink), output)
                .map(Some),
            RouteOp::Remove {
                input: Some(input),
                sink,
                output,
            } => switch
                .remove_route(input, self.sink(*sink), output)
                .map(|()| None),
            RouteOp::Remove {
                input: None,
                sink,
                output,
            } => switch
                .remove_default_route_on(self.sink(*sink), output)
                .map(|()| None),
        }
    }

    /// Bytes each sink received on `channel`.
    pub fn data(&self, channel: &ChannelId) -> Vec<Vec<u8>> {
        self.sinks.iter().map(|s| s.data(channel)).collect()
    }
}
