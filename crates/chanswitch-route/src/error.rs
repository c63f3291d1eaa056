//! Route error types.

use chanswitch_core::ChannelId;
use thiserror::Error;

/// Result type for route operations.
pub type Result<T> = std::result::Result<T, RouteError>;

/// Errors from route-table management.
///
/// `input` is `None` for the default route list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No route matches the exact (input, sink, output) triple.
    #[error("no route from {} to output channel {output}", describe(.input))]
    RouteNotFound {
        input: Option<ChannelId>,
        output: ChannelId,
    },

    /// The route already exists and duplicates are rejected.
    #[error("duplicate route from {} to output channel {output}", describe(.input))]
    DuplicateRoute {
        input: Option<ChannelId>,
        output: ChannelId,
    },

    /// Zero-sized sinks have no distinct address to identify them by.
    #[error("sink type {type_name} is zero-sized and cannot be routed to")]
    ZeroSizedSink { type_name: &'static str },
}

impl RouteError {
    /// Create a RouteNotFound error.
    #[inline]
    pub fn not_found(input: Option<&ChannelId>, output: &ChannelId) -> Self {
        Self::RouteNotFound {
            input: input.cloned(),
            output: output.clone(),
        }
    }

    /// Create a DuplicateRoute error.
    #[inline]
    pub fn duplicate(input: Option<&ChannelId>, output: &ChannelId) -> Self {
        Self::DuplicateRoute {
            input: input.cloned(),
            output: output.clone(),
        }
    }
}

fn describe(input: &Option<ChannelId>) -> String {
    match input {
        Some(channel) => format!("input channel {}", channel),
        None => "default routes".to_string(),
    }
}
