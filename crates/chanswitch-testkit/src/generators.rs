//! Proptest generators for property-based testing.

use proptest::prelude::*;

use chanswitch_core::ChannelId;

/// Generate a channel from a small alphabet, so routes collide often.
pub fn channel_id() -> impl Strategy<Value = ChannelId> {
    "[a-c]{0,2}".prop_map(ChannelId::from)
}

/// Generate a channel from arbitrary bytes.
pub fn raw_channel_id() -> impl Strategy<Value = ChannelId> {
    prop::collection::vec(any::<u8>(), 0..8).prop_map(ChannelId::from)
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// A route mutation, naming sinks by index into a [`SinkBank`](crate::SinkBank).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOp {
    /// Add a specific route, or a default route when `input` is `None`.
    Add {
        input: Option<ChannelId>,
        sink: usize,
        output: ChannelId,
    },
    /// Remove a specific route, or a default route when `input` is `None`.
    Remove {
        input: Option<ChannelId>,
        sink: usize,
        output: ChannelId,
    },
}

/// Generate one route mutation over `sinks` sinks.
pub fn route_op(sinks: usize) -> impl Strategy<Value = RouteOp> {
    let sinks = sinks.max(1);
    (
        any::<bool>(),
        prop::option::weighted(0.7, channel_id()),
        0..sinks,
        channel_id(),
    )
        .prop_map(|(add, input, sink, output)| {
            if add {
                RouteOp::Add {
                    input,
                    sink,
                    output,
                }
            } else {
                RouteOp::Remove {
                    input,
                    sink,
                    output,
                }
            }
        })
}

/// Generate a sequence of route mutations, biased towards additions.
pub fn route_script(sinks: usize, max_len: usize) -> impl Strategy<Value = Vec<RouteOp>> {
    let op = prop_oneof![
        3 => route_op(sinks).prop_map(|op| match op {
            RouteOp::Remove { input, sink, output } => RouteOp::Add { input, sink, output },
            add => add,
        }),
        1 => route_op(sinks),
    ];
    prop::collection::vec(op, 0..=max_len)
}

/// Generate how many calls each of `sinks` sinks refuses before accepting.
pub fn stall_schedule(sinks: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..4, sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn test_route_op_sink_in_range() {
        let mut runner = TestRunner::default();
        for _ in 0..64 {
            let op = route_op(3).new_tree(&mut runner).unwrap().current();
            let sink = match op {
                RouteOp::Add { sink, .. } | RouteOp::Remove { sink, .. } => sink,
            };
            assert!(sink < 3);
        }
    }

    proptest! {
        #[test]
        fn stall_schedule_has_one_entry_per_sink(schedule in stall_schedule(5)) {
            prop_assert_eq!(schedule.len(), 5);
        }
    }
}
