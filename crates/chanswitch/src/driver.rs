//! Async retry driver.
//!
//! Drives a switch in non-blocking mode from an async task: each blocked
//! attempt sleeps for the configured interval and then repeats the same call,
//! which resumes the suspended fan-out. The switch lock is never held across
//! an await.
//!
//! Each function returns how many attempts were blocked before the operation
//! completed. When `max_attempts` is reached the function fails with
//! [`SwitchError::RetriesExhausted`] and the fan-out stays suspended; call
//! [`ChannelSwitch::abandon`] to drop it or retry later.
//!
//! Attempts are non-blocking, so a [`QueueSink`](chanswitch_core::QueueSink)
//! destination never parks the runtime thread.

use chanswitch_core::{ChannelId, Propagation};

use crate::config::RetryConfig;
use crate::error::{Result, SwitchError};
use crate::switch::ChannelSwitch;

/// Put `data` on `channel`, retrying until every destination took it.
pub async fn put_until_delivered(
    switch: &ChannelSwitch<'_>,
    channel: &ChannelId,
    data: &[u8],
    message_end: bool,
) -> Result<u32> {
    retry(&switch.config().retry, channel, || {
        Ok(switch.put(channel, data, message_end, false)?.is_delivered())
    })
    .await
}

/// End the current message on `channel`, retrying until every destination
/// took the signal.
pub async fn message_end_until_delivered(
    switch: &ChannelSwitch<'_>,
    channel: &ChannelId,
    propagation: Propagation,
) -> Result<u32> {
    retry(&switch.config().retry, channel, || {
        Ok(switch
            .message_end(channel, propagation, false)?
            .is_delivered())
    })
    .await
}

/// Send message-series end on `channel`, retrying until every destination
/// took it.
pub async fn message_series_end_until_delivered(
    switch: &ChannelSwitch<'_>,
    channel: &ChannelId,
    propagation: Propagation,
) -> Result<u32> {
    retry(&switch.config().retry, channel, || {
        Ok(switch
            .message_series_end(channel, propagation, false)?
            .is_delivered())
    })
    .await
}

/// Flush `channel`, retrying until every destination reports clean.
pub async fn flush_until_clean(
    switch: &ChannelSwitch<'_>,
    channel: &ChannelId,
    complete: bool,
    propagation: Propagation,
) -> Result<u32> {
    retry(&switch.config().retry, channel, || {
        Ok(switch
            .flush(channel, complete, propagation, false)?
            .is_clean())
    })
    .await
}

async fn retry(
    config: &RetryConfig,
    channel: &ChannelId,
    mut attempt: impl FnMut() -> Result<bool>,
) -> Result<u32> {
    let mut blocked = 0u32;
    loop {
        if attempt()? {
            if blocked > 0 {
                tracing::debug!(channel = %channel, blocked, "fan-out completed after retries");
            }
            return Ok(blocked);
        }

        blocked += 1;
        if config.max_attempts.is_some_and(|max| blocked >= max) {
            tracing::warn!(channel = %channel, attempts = blocked, "giving up on blocked fan-out");
            return Err(SwitchError::RetriesExhausted { attempts: blocked });
        }

        tracing::trace!(channel = %channel, blocked, "fan-out blocked, backing off");
        tokio::time::sleep(config.interval()).await;
    }
}
