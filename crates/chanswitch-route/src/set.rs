//! Route set: specific and default routes together.

use chanswitch_core::{is_zero_sized, ChannelId, Sink};
use serde::{Deserialize, Serialize};

use crate::cursor::{RouteCursor, RouteSource};
use crate::default::DefaultRouteList;
use crate::destination::Destination;
use crate::error::{Result, RouteError};
use crate::table::{Insertion, RouteTable};

/// What to do when an identical route is added twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Adding an existing route is a no-op.
    #[default]
    Ignore,
    /// Adding an existing route fails with [`RouteError::DuplicateRoute`].
    Reject,
}

/// Specific routes plus default routes, and the resolution rule between them.
#[derive(Debug, Clone, Default)]
pub struct RouteSet<'a> {
    table: RouteTable<'a>,
    defaults: DefaultRouteList<'a>,
    policy: DuplicatePolicy,
}

impl<'a> RouteSet<'a> {
    /// Create an empty route set.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            table: RouteTable::new(),
            defaults: DefaultRouteList::new(),
            policy,
        }
    }

    /// Route `input` to `output` on `sink`, after any existing routes for
    /// `input`.
    pub fn add_route(
        &mut self,
        input: ChannelId,
        sink: &'a dyn Sink,
        output: ChannelId,
    ) -> Result<Insertion> {
        reject_zero_sized(sink)?;
        let destination = Destination::new(sink, output);
        if self.policy == DuplicatePolicy::Reject && self.table.contains(&input, &destination) {
            return Err(RouteError::duplicate(Some(&input), destination.channel()));
        }
        let output = destination.channel().clone();
        let insertion = self.table.insert(input.clone(), destination);
        if insertion == Insertion::Added {
            tracing::debug!(input = %input, output = %output, "added route");
        }
        Ok(insertion)
    }

    /// Remove the route matching the exact (input, sink, output) triple.
    pub fn remove_route(
        &mut self,
        input: &ChannelId,
        sink: &dyn Sink,
        output: &ChannelId,
    ) -> Result<()> {
        let destination = Destination::new(sink, output.clone());
        if !self.table.remove(input, &destination) {
            return Err(RouteError::not_found(Some(input), output));
        }
        tracing::debug!(input = %input, output = %output, "removed route");
        Ok(())
    }

    /// Send traffic for every unrouted input channel to `output` on `sink`.
    pub fn add_default_route(&mut self, sink: &'a dyn Sink, output: ChannelId) -> Result<Insertion> {
        reject_zero_sized(sink)?;
        let destination = Destination::new(sink, output.clone());
        if self.policy == DuplicatePolicy::Reject && self.defaults.contains(&destination) {
            return Err(RouteError::duplicate(None, &output));
        }
        let insertion = self.defaults.insert(destination);
        if insertion == Insertion::Added {
            tracing::debug!(output = %output, "added default route");
        }
        Ok(insertion)
    }

    /// Remove the default route matching (sink, output).
    pub fn remove_default_route(&mut self, sink: &dyn Sink, output: &ChannelId) -> Result<()> {
        let destination = Destination::new(sink, output.clone());
        if !self.defaults.remove(&destination) {
            return Err(RouteError::not_found(None, output));
        }
        tracing::debug!(output = %output, "removed default route");
        Ok(())
    }

    /// Resolve the destinations for `input`: its specific routes if it has
    /// any, otherwise the default routes.
    pub fn resolve(&self, input: &ChannelId) -> RouteCursor<'_, 'a> {
        let specific = self.table.get(input);
        if specific.is_empty() {
            RouteCursor::new(RouteSource::Default, self.defaults.as_slice())
        } else {
            RouteCursor::new(RouteSource::Specific, specific)
        }
    }

    /// The specific route table.
    pub fn table(&self) -> &RouteTable<'a> {
        &self.table
    }

    /// The default route list.
    pub fn defaults(&self) -> &DefaultRouteList<'a> {
        &self.defaults
    }

    /// The active duplicate policy.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Whether no routes of either kind exist.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.defaults.is_empty()
    }

    /// Drop every route of both kinds.
    pub fn clear(&mut self) {
        self.table.clear();
        self.defaults.clear();
    }
}

fn reject_zero_sized(sink: &dyn Sink) -> Result<()> {
    if is_zero_sized(sink) {
        return Err(RouteError::ZeroSizedSink {
            type_name: sink.sink_type_name(),
        });
    }
    Ok(())
}
