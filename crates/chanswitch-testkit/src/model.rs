//! Reference routing model.
//!
//! A deliberately naive list of routes, resolved by linear scan. Property
//! tests replay the same route script onto a real switch and compare.

use chanswitch_core::ChannelId;

use crate::generators::RouteOp;

/// A route in the model: `input` of `None` marks a default route.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelRoute {
    input: Option<ChannelId>,
    sink: usize,
    output: ChannelId,
}

/// Expected routing behaviour with duplicates ignored.
#[derive(Debug, Clone, Default)]
pub struct RouteModel {
    routes: Vec<ModelRoute>,
}

impl RouteModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation. Returns whether the model changed.
    pub fn apply(&mut self, op: &RouteOp) -> bool {
        match op {
            RouteOp::Add {
                input,
                sink,
                output,
            } => {
                let route = ModelRoute {
                    input: input.clone(),
                    sink: *sink,
                    output: output.clone(),
                };
                if self.routes.contains(&route) {
                    return false;
                }
                self.routes.push(route);
                true
            }
            RouteOp::Remove {
                input,
                sink,
                output,
            } => {
                let before = self.routes.len();
                self.routes.retain(|r| {
                    !(r.input == *input && r.sink == *sink && r.output == *output)
                });
                before != self.routes.len()
            }
        }
    }

    /// (sink, output) pairs `input` resolves to, in delivery order.
    pub fn resolve(&self, input: &ChannelId) -> Vec<(usize, ChannelId)> {
        let specific: Vec<_> = self
            .routes
            .iter()
            .filter(|r| r.input.as_ref() == Some(input))
            .map(|r| (r.sink, r.output.clone()))
            .collect();
        if !specific.is_empty() {
            return specific;
        }
        self.routes
            .iter()
            .filter(|r| r.input.is_none())
            .map(|r| (r.sink, r.output.clone()))
            .collect()
    }

    /// Number of specific routes.
    pub fn route_count(&self) -> usize {
        self.routes.iter().filter(|r| r.input.is_some()).count()
    }

    /// Number of default routes.
    pub fn default_route_count(&self) -> usize {
        self.routes.iter().filter(|r| r.input.is_none()).count()
    }
}
