//! The channel switch.
//!
//! Accepts bytes tagged with an input channel and forwards them to every
//! destination resolved for that channel, in route order, along with the
//! message-end, flush and message-series-end signals.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::BytesMut;
use chanswitch_core::{
    same_sink, Ack, ChannelId, Delivery, FlushStatus, Propagation, Sink, SinkError,
};
use chanswitch_route::{Destination, Insertion, RouteSet};

use crate::config::{PutSpacePolicy, SwitchConfig};
use crate::error::{Result, SwitchError};
use crate::resume::{Operation, ResumeState, Stage};

/// Result of a forwarding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every resolved destination took everything.
    Delivered,
    /// A destination pushed back. Call again with the same arguments.
    Blocked(ResumeState),
}

impl Outcome {
    /// Whether every destination was served.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered)
    }

    /// Whether the fan-out is suspended.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Outcome::Blocked(_))
    }
}

/// Routes input channels to destination sinks.
///
/// The switch borrows its destinations and never owns them: every sink must
/// outlive the switch, and dropping the switch leaves the sinks untouched.
///
/// # Flow control
///
/// When a destination pushes back the call returns [`Outcome::Blocked`] and
/// the switch remembers where it stopped, one position per input channel.
/// Calling the same operation again with the same arguments resumes there,
/// so every destination sees each byte and each signal exactly once, even
/// when calls on other channels run in between. While a put or series end is
/// suspended, routes cannot change; call [`ChannelSwitch::abandon`] to give
/// up on it. A suspended flush does not hold routes back: changing a route
/// drops it and the next flush starts over.
///
/// # Concurrency
///
/// All state sits behind one lock, held for the whole of each call,
/// including while a destination blocks. A switch must not be reachable from
/// its own destinations.
pub struct ChannelSwitch<'a> {
    config: SwitchConfig,
    state: Mutex<SwitchState<'a>>,
}

struct SwitchState<'a> {
    routes: RouteSet<'a>,
    /// Suspended fan-outs by input channel.
    pending: BTreeMap<ChannelId, ResumeState>,
}

/// Bytes handed to destinations during a put.
enum Body<'d> {
    Shared(&'d [u8]),
    Modifiable(&'d mut [u8]),
}

impl Body<'_> {
    fn len(&self) -> usize {
        match self {
            Body::Shared(data) => data.len(),
            Body::Modifiable(data) => data.len(),
        }
    }

    fn deliver(
        &mut self,
        destination: &Destination<'_>,
        offset: usize,
        blocking: bool,
    ) -> chanswitch_core::Result<Delivery> {
        let sink = destination.sink();
        match self {
            Body::Shared(data) => sink.accept(destination.channel(), &data[offset..], blocking),
            Body::Modifiable(data) => {
                sink.accept_modifiable(destination.channel(), &mut data[offset..], blocking)
            }
        }
    }
}

impl<'a> ChannelSwitch<'a> {
    /// Create a switch with no routes.
    pub fn new() -> Self {
        Self::with_config(SwitchConfig::default())
    }

    /// Create a switch with no routes and the given configuration.
    pub fn with_config(config: SwitchConfig) -> Self {
        Self {
            state: Mutex::new(SwitchState {
                routes: RouteSet::new(config.duplicate_policy),
                pending: BTreeMap::new(),
            }),
            config,
        }
    }

    /// Create a switch sending every channel to `sink` on the default channel.
    pub fn with_default_route(sink: &'a dyn Sink) -> Result<Self> {
        Self::with_default_route_on(sink, ChannelId::DEFAULT)
    }

    /// Create a switch sending every channel to `output` on `sink`.
    pub fn with_default_route_on(
        sink: &'a dyn Sink,
        output: impl Into<ChannelId>,
    ) -> Result<Self> {
        let mut switch = Self::new();
        switch
            .state_mut()
            .routes
            .add_default_route(sink, output.into())?;
        Ok(switch)
    }

    /// The active configuration.
    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Drop every route and any suspended fan-out.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.routes.clear();
        state.pending.clear();
        tracing::debug!("switch reset");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Route Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Route `input` to `output` on `sink`, after existing routes for `input`.
    pub fn add_route(
        &self,
        input: impl Into<ChannelId>,
        sink: &'a dyn Sink,
        output: impl Into<ChannelId>,
    ) -> Result<Insertion> {
        self.reject_self(sink)?;
        self.change_routes(|routes| routes.add_route(input.into(), sink, output.into()))
    }

    /// Remove the route matching the exact (input, sink, output) triple.
    pub fn remove_route(
        &self,
        input: impl Into<ChannelId>,
        sink: &dyn Sink,
        output: impl Into<ChannelId>,
    ) -> Result<()> {
        self.change_routes(|routes| routes.remove_route(&input.into(), sink, &output.into()))
    }

    /// Send unrouted channels to `sink` on the default channel.
    pub fn add_default_route(&self, sink: &'a dyn Sink) -> Result<Insertion> {
        self.add_default_route_on(sink, ChannelId::DEFAULT)
    }

    /// Send unrouted channels to `output` on `sink`.
    pub fn add_default_route_on(
        &self,
        sink: &'a dyn Sink,
        output: impl Into<ChannelId>,
    ) -> Result<Insertion> {
        self.reject_self(sink)?;
        self.change_routes(|routes| routes.add_default_route(sink, output.into()))
    }

    /// Remove the default route to `sink` on the default channel.
    pub fn remove_default_route(&self, sink: &dyn Sink) -> Result<()> {
        self.remove_default_route_on(sink, ChannelId::DEFAULT)
    }

    /// Remove the default route to `output` on `sink`.
    pub fn remove_default_route_on(
        &self,
        sink: &dyn Sink,
        output: impl Into<ChannelId>,
    ) -> Result<()> {
        self.change_routes(|routes| routes.remove_default_route(sink, &output.into()))
    }

    /// Number of specific routes.
    pub fn route_count(&self) -> usize {
        self.lock().routes.table().len()
    }

    /// Number of default routes.
    pub fn default_route_count(&self) -> usize {
        self.lock().routes.defaults().len()
    }

    /// Output channels `input` would currently fan out to, in order.
    pub fn resolve_channels(&self, input: &ChannelId) -> Vec<ChannelId> {
        self.lock()
            .routes
            .resolve(input)
            .map(|d| d.channel().clone())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Flow Control
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether any fan-out is suspended.
    pub fn is_blocked(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Input channels with a suspended fan-out, in channel order.
    pub fn pending_channels(&self) -> Vec<ChannelId> {
        self.lock().pending.keys().cloned().collect()
    }

    /// Where the suspended fan-out on `channel` would continue, if any.
    pub fn resume_state(&self, channel: &ChannelId) -> Option<ResumeState> {
        self.lock().pending.get(channel).cloned()
    }

    /// Give up on the suspended fan-out on `channel`. Returns what was
    /// dropped.
    pub fn abandon(&self, channel: &ChannelId) -> Option<ResumeState> {
        let dropped = self.lock().pending.remove(channel);
        if let Some(state) = &dropped {
            tracing::debug!(channel = %state.channel, operation = ?state.operation, "abandoned fan-out");
        }
        dropped
    }

    /// Give up on every suspended fan-out.
    pub fn abandon_all(&self) -> Vec<ResumeState> {
        let dropped: Vec<ResumeState> = std::mem::take(&mut self.lock().pending)
            .into_values()
            .collect();
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "abandoned all fan-outs");
        }
        dropped
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Forwarding
    // ─────────────────────────────────────────────────────────────────────────

    /// Forward `data` on `channel` to every resolved destination.
    ///
    /// With `message_end` each destination also gets a message-end signal
    /// (unlimited propagation) after its bytes.
    pub fn put(
        &self,
        channel: &ChannelId,
        data: &[u8],
        message_end: bool,
        blocking: bool,
    ) -> Result<Outcome> {
        let boundary = message_end.then_some(Propagation::UNLIMITED);
        self.put_body(channel, Body::Shared(data), boundary, blocking)
    }

    /// Like [`ChannelSwitch::put`], but lets a sole destination modify
    /// `data` in place. With several destinations nobody may modify it.
    pub fn put_modifiable(
        &self,
        channel: &ChannelId,
        data: &mut [u8],
        message_end: bool,
        blocking: bool,
    ) -> Result<Outcome> {
        let boundary = message_end.then_some(Propagation::UNLIMITED);
        self.put_body(channel, Body::Modifiable(data), boundary, blocking)
    }

    /// End the current message on `channel` at every resolved destination.
    pub fn message_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        blocking: bool,
    ) -> Result<Outcome> {
        self.put_body(channel, Body::Shared(&[]), Some(propagation), blocking)
    }

    /// Ask every resolved destination to flush.
    ///
    /// Returns `HasPending` at the first destination still holding data; the
    /// next call resumes at that destination.
    pub fn flush(
        &self,
        channel: &ChannelId,
        complete: bool,
        propagation: Propagation,
        blocking: bool,
    ) -> Result<FlushStatus> {
        let suspended = self.signal(Operation::Flush, channel, |destination| {
            let sink = destination.sink();
            let status = sink.flush(destination.channel(), complete, propagation, blocking)?;
            Ok(status.is_clean())
        })?;
        Ok(match suspended {
            None => FlushStatus::AllClean,
            Some(_) => FlushStatus::HasPending,
        })
    }

    /// Tell every resolved destination that no more messages will arrive.
    pub fn message_series_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        blocking: bool,
    ) -> Result<Outcome> {
        let suspended = self.signal(Operation::MessageSeriesEnd, channel, |destination| {
            let ack = destination.sink().message_series_end(
                destination.channel(),
                propagation,
                blocking,
            )?;
            Ok(!ack.is_blocked())
        })?;
        Ok(suspended.map_or(Outcome::Delivered, Outcome::Blocked))
    }

    /// A buffer of at least `size_hint` bytes to fill before calling `put`.
    ///
    /// With exactly one resolved destination the buffer comes from that
    /// sink. Otherwise an owned buffer is returned, unless the put-space
    /// policy is strict and several destinations are resolved.
    pub fn create_put_space(&self, channel: &ChannelId, size_hint: usize) -> Result<BytesMut> {
        let state = self.lock();
        let cursor = state.routes.resolve(channel);
        if let Some(destination) = cursor.sole() {
            return Ok(destination.sink().reserve_space(destination.channel(), size_hint));
        }
        if cursor.total() > 1 && self.config.put_space == PutSpacePolicy::Strict {
            return Err(SwitchError::AmbiguousPutSpace {
                destinations: cursor.total(),
            });
        }
        Ok(BytesMut::with_capacity(size_hint))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn put_body(
        &self,
        channel: &ChannelId,
        body: Body<'_>,
        boundary: Option<Propagation>,
        blocking: bool,
    ) -> Result<Outcome> {
        let mut guard = self.lock();
        let SwitchState { routes, pending } = &mut *guard;

        let length = body.len();
        let mut position = take_position(pending, Operation::Put, channel, length, boundary.is_some());
        let mut cursor = routes.resolve(channel);

        // In-place modification is only safe when nobody else reads the bytes.
        let mut body = match body {
            Body::Modifiable(data) if cursor.total() != 1 => Body::Shared(data),
            other => other,
        };

        cursor.seek(position.destination);
        tracing::trace!(
            channel = %channel,
            bytes = length,
            from = position.destination,
            destinations = cursor.total(),
            "fan-out put"
        );

        for destination in cursor {
            if position.stage == Stage::Body {
                if position.offset < length {
                    match body.deliver(destination, position.offset, blocking) {
                        Ok(Delivery::Accepted) => position.offset = length,
                        Ok(Delivery::Blocked { remaining }) => {
                            let offered = length - position.offset;
                            position.offset += offered - remaining.min(offered);
                            return Ok(suspend(pending, position));
                        }
                        Err(source) => return Err(fail(pending, position, source)),
                    }
                }
                position.stage = Stage::Boundary;
            }

            if let Some(propagation) = boundary {
                let ack = destination.sink().accept_message_end(
                    destination.channel(),
                    propagation,
                    blocking,
                );
                match ack {
                    Ok(Ack::Accepted) => {}
                    Ok(Ack::Blocked) => return Ok(suspend(pending, position)),
                    Err(source) => return Err(fail(pending, position, source)),
                }
            }

            position.advance();
        }

        Ok(Outcome::Delivered)
    }

    /// Send a signal to each resolved destination in turn. `send` returns
    /// `Ok(false)` when the destination is not done yet.
    fn signal(
        &self,
        operation: Operation,
        channel: &ChannelId,
        mut send: impl FnMut(&Destination<'_>) -> chanswitch_core::Result<bool>,
    ) -> Result<Option<ResumeState>> {
        let mut guard = self.lock();
        let SwitchState { routes, pending } = &mut *guard;

        let mut position = take_position(pending, operation, channel, 0, false);
        let mut cursor = routes.resolve(channel);
        cursor.seek(position.destination);
        tracing::trace!(
            channel = %channel,
            operation = ?operation,
            from = position.destination,
            destinations = cursor.total(),
            "fan-out signal"
        );

        for destination in cursor {
            match send(destination) {
                Ok(true) => position.advance(),
                Ok(false) => {
                    pending.insert(channel.clone(), position.clone());
                    return Ok(Some(position));
                }
                Err(source) => return Err(fail(pending, position, source)),
            }
        }

        Ok(None)
    }

    fn reject_self(&self, sink: &dyn Sink) -> Result<()> {
        if same_sink(sink, self) {
            return Err(SwitchError::SelfRoute);
        }
        Ok(())
    }

    /// Apply a route change, refusing while a put or series end is
    /// suspended. Suspended flushes are dropped once the change succeeds,
    /// since their destination indices no longer line up.
    fn change_routes<T>(
        &self,
        change: impl FnOnce(&mut RouteSet<'a>) -> chanswitch_route::Result<T>,
    ) -> Result<T> {
        let mut state = self.lock();
        if let Some(blocked) = state
            .pending
            .values()
            .find(|resume| resume.operation != Operation::Flush)
        {
            return Err(SwitchError::FanoutPending {
                channel: blocked.channel.clone(),
            });
        }
        let changed = change(&mut state.routes)?;
        if !state.pending.is_empty() {
            tracing::debug!(flushes = state.pending.len(), "routes changed, dropping suspended flushes");
            state.pending.clear();
        }
        Ok(changed)
    }

    fn state_mut(&mut self) -> &mut SwitchState<'a> {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, SwitchState<'a>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ChannelSwitch<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick up the suspended fan-out on `channel` if this call continues it, or
/// start a fresh one.
fn take_position(
    pending: &mut BTreeMap<ChannelId, ResumeState>,
    operation: Operation,
    channel: &ChannelId,
    length: usize,
    message_end: bool,
) -> ResumeState {
    match pending.remove(channel) {
        Some(state) if state.continues(operation, channel, length, message_end) => state,
        Some(stale) => {
            tracing::warn!(
                channel = %stale.channel,
                operation = ?stale.operation,
                destination = stale.destination,
                "discarding suspended fan-out for a different call"
            );
            ResumeState::start(operation, channel, length, message_end)
        }
        None => ResumeState::start(operation, channel, length, message_end),
    }
}

fn suspend(pending: &mut BTreeMap<ChannelId, ResumeState>, position: ResumeState) -> Outcome {
    tracing::trace!(
        channel = %position.channel,
        destination = position.destination,
        offset = position.offset,
        "destination blocked"
    );
    pending.insert(position.channel.clone(), position.clone());
    Outcome::Blocked(position)
}

fn fail(
    pending: &mut BTreeMap<ChannelId, ResumeState>,
    position: ResumeState,
    source: SinkError,
) -> SwitchError {
    tracing::warn!(
        channel = %position.channel,
        destination = position.destination,
        error = %source,
        "destination failed"
    );
    let destination = position.destination;
    pending.insert(position.channel.clone(), position);
    SwitchError::Sink {
        destination,
        source,
    }
}

impl Sink for ChannelSwitch<'_> {
    fn accept(
        &self,
        channel: &ChannelId,
        data: &[u8],
        blocking: bool,
    ) -> chanswitch_core::Result<Delivery> {
        match self.put(channel, data, false, blocking) {
            Ok(Outcome::Delivered) => Ok(Delivery::Accepted),
            // Retrying the whole range is how a suspended put resumes.
            Ok(Outcome::Blocked(_)) => Ok(Delivery::Blocked {
                remaining: data.len(),
            }),
            Err(err) => Err(SinkError::downstream(err)),
        }
    }

    fn accept_modifiable(
        &self,
        channel: &ChannelId,
        data: &mut [u8],
        blocking: bool,
    ) -> chanswitch_core::Result<Delivery> {
        let length = data.len();
        match self.put_modifiable(channel, data, false, blocking) {
            Ok(Outcome::Delivered) => Ok(Delivery::Accepted),
            Ok(Outcome::Blocked(_)) => Ok(Delivery::Blocked { remaining: length }),
            Err(err) => Err(SinkError::downstream(err)),
        }
    }

    fn accept_message_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        blocking: bool,
    ) -> chanswitch_core::Result<Ack> {
        match self.message_end(channel, propagation, blocking) {
            Ok(Outcome::Delivered) => Ok(Ack::Accepted),
            Ok(Outcome::Blocked(_)) => Ok(Ack::Blocked),
            Err(err) => Err(SinkError::downstream(err)),
        }
    }

    fn flush(
        &self,
        channel: &ChannelId,
        complete: bool,
        propagation: Propagation,
        blocking: bool,
    ) -> chanswitch_core::Result<FlushStatus> {
        ChannelSwitch::flush(self, channel, complete, propagation, blocking)
            .map_err(SinkError::downstream)
    }

    fn message_series_end(
        &self,
        channel: &ChannelId,
        propagation: Propagation,
        blocking: bool,
    ) -> chanswitch_core::Result<Ack> {
        match ChannelSwitch::message_series_end(self, channel, propagation, blocking) {
            Ok(Outcome::Delivered) => Ok(Ack::Accepted),
            Ok(Outcome::Blocked(_)) => Ok(Ack::Blocked),
            Err(err) => Err(SinkError::downstream(err)),
        }
    }

    fn reserve_space(&self, channel: &ChannelId, size_hint: usize) -> BytesMut {
        self.create_put_space(channel, size_hint)
            .unwrap_or_else(|_| BytesMut::with_capacity(size_hint))
    }
}
