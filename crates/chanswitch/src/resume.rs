//! Resume state for a suspended fan-out.
//!
//! When a destination pushes back, the switch records where the fan-out
//! stopped. Re-invoking the same operation with the same arguments picks up
//! there: destinations already served are skipped and the blocked one gets
//! only the bytes it has not taken yet.

use chanswitch_core::ChannelId;
use serde::{Deserialize, Serialize};

/// The switch operation a resume state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Put,
    Flush,
    MessageSeriesEnd,
}

/// What the blocked destination still needs within a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Body bytes from `offset` onwards.
    Body,
    /// Only the message-end signal.
    Boundary,
}

/// Where a suspended fan-out continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    /// Operation that was suspended.
    pub operation: Operation,
    /// Input channel of the suspended call.
    pub channel: ChannelId,
    /// Length of the byte range of the suspended call (0 for signals).
    pub length: usize,
    /// Whether the suspended put also ended the message.
    pub message_end: bool,
    /// Index of the first destination not fully served.
    pub destination: usize,
    /// Bytes of the range that destination already took.
    pub offset: usize,
    /// What that destination still needs.
    pub stage: Stage,
}

impl ResumeState {
    /// Fresh position for an operation, at the first destination.
    pub(crate) fn start(
        operation: Operation,
        channel: &ChannelId,
        length: usize,
        message_end: bool,
    ) -> Self {
        Self {
            operation,
            channel: channel.clone(),
            length,
            message_end,
            destination: 0,
            offset: 0,
            stage: Stage::Body,
        }
    }

    /// Whether this state continues a call with these arguments.
    pub fn continues(
        &self,
        operation: Operation,
        channel: &ChannelId,
        length: usize,
        message_end: bool,
    ) -> bool {
        self.operation == operation
            && &self.channel == channel
            && self.length == length
            && self.message_end == message_end
            && self.offset <= length
    }

    /// Bytes the blocked destination has not taken yet.
    pub fn remaining(&self) -> usize {
        match self.stage {
            Stage::Body => self.length - self.offset,
            Stage::Boundary => 0,
        }
    }

    /// Move on to the next destination.
    pub(crate) fn advance(&mut self) {
        self.destination += 1;
        self.offset = 0;
        self.stage = Stage::Body;
    }
}
