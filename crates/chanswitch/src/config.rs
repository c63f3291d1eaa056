//! Switch configuration.

use std::time::Duration;

use chanswitch_route::DuplicatePolicy;
use serde::{Deserialize, Serialize};

/// What `create_put_space` does when several destinations are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutSpacePolicy {
    /// Hand out a buffer owned by the caller.
    #[default]
    Fallback,
    /// Fail with [`SwitchError::AmbiguousPutSpace`](crate::SwitchError).
    Strict,
}

/// Retry behaviour of the async driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Pause between attempts, in milliseconds.
    pub interval_ms: u64,
    /// Give up after this many blocked attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryConfig {
    /// Pause between attempts.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1,
            max_attempts: None,
        }
    }
}

/// Configuration for a [`ChannelSwitch`](crate::ChannelSwitch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Whether re-adding an identical route is ignored or rejected.
    pub duplicate_policy: DuplicatePolicy,
    /// Put-space behaviour with several destinations.
    pub put_space: PutSpacePolicy,
    /// Async driver retry behaviour.
    pub retry: RetryConfig,
}
