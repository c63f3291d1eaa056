//! Error types for the switch.

use chanswitch_core::{ChannelId, SinkError};
use chanswitch_route::RouteError;
use thiserror::Error;

/// Errors that can occur during switch operations.
///
/// Backpressure is not an error; see [`Outcome::Blocked`](crate::Outcome).
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Route management failed.
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// A destination sink failed. The switch stays positioned at it.
    #[error("destination {destination} failed: {source}")]
    Sink {
        destination: usize,
        #[source]
        source: SinkError,
    },

    /// A put buffer was requested while several destinations are resolved.
    #[error("put space is ambiguous with {destinations} resolved destinations")]
    AmbiguousPutSpace { destinations: usize },

    /// Routes cannot change while a fan-out is suspended.
    #[error("fan-out on channel {channel} is suspended; abandon it before changing routes")]
    FanoutPending { channel: ChannelId },

    /// A switch cannot route to itself.
    #[error("a switch cannot be its own destination")]
    SelfRoute,

    /// The retry driver gave up.
    #[error("still blocked after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Result type for switch operations.
pub type Result<T> = std::result::Result<T, SwitchError>;
