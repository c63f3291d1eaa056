//! Specific routes keyed by input channel.

use std::collections::BTreeMap;

use chanswitch_core::ChannelId;

use crate::destination::Destination;

/// Result of inserting a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Appended at the end of the list.
    Added,
    /// An equal destination was already present; nothing changed.
    AlreadyPresent,
}

/// Specific routes: input channel → ordered, duplicate-free destinations.
///
/// An input channel with no destinations has no entry at all, so removing the
/// last route for a channel hands that channel back to the default routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable<'a> {
    routes: BTreeMap<ChannelId, Vec<Destination<'a>>>,
}

impl<'a> RouteTable<'a> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }

    /// Append `destination` to the list for `input` unless already present.
    pub fn insert(&mut self, input: ChannelId, destination: Destination<'a>) -> Insertion {
        let list = self.routes.entry(input).or_default();
        if list.contains(&destination) {
            return Insertion::AlreadyPresent;
        }
        list.push(destination);
        Insertion::Added
    }

    /// Remove the destination equal to `destination` under `input`.
    ///
    /// Returns `true` only when a route was removed.
    pub fn remove(&mut self, input: &ChannelId, destination: &Destination<'_>) -> bool {
        let Some(list) = self.routes.get_mut(input) else {
            return false;
        };
        let Some(index) = list.iter().position(|d| d == destination) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            self.routes.remove(input);
        }
        true
    }

    /// Whether an equal destination is registered under `input`.
    pub fn contains(&self, input: &ChannelId, destination: &Destination<'_>) -> bool {
        self.get(input).iter().any(|d| d == destination)
    }

    /// Destinations for `input`, in insertion order. Empty if none.
    pub fn get(&self, input: &ChannelId) -> &[Destination<'a>] {
        self.routes.get(input).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `input` has at least one specific route.
    pub fn has_routes(&self, input: &ChannelId) -> bool {
        self.routes.contains_key(input)
    }

    /// Number of input channels with specific routes.
    pub fn channel_count(&self) -> usize {
        self.routes.len()
    }

    /// Total number of routes across all input channels.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    /// Whether the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate input channels in order with their destinations.
    pub fn iter(&self) -> impl Iterator<Item = (&ChannelId, &[Destination<'a>])> {
        self.routes.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Drop every route.
    pub fn clear(&mut self) {
        self.routes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanswitch_core::MemorySink;

    fn ch(name: &str) -> ChannelId {
        ChannelId::from(name)
    }

    #[test]
    fn test_insert_preserves_order() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let mut table = RouteTable::new();

        table.insert(ch("in"), Destination::new(&b, ch("1")));
        table.insert(ch("in"), Destination::new(&a, ch("2")));
        table.insert(ch("in"), Destination::new(&a, ch("0")));

        let outputs: Vec<_> = table.get(&ch("in")).iter().map(|d| d.channel().clone()).collect();
        assert_eq!(outputs, vec![ch("1"), ch("2"), ch("0")]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.channel_count(), 1);
    }

    #[test]
    fn test_insert_duplicate_is_noop() {
        let a = MemorySink::new();
        let mut table = RouteTable::new();

        assert_eq!(table.insert(ch("in"), Destination::new(&a, ch("x"))), Insertion::Added);
        assert_eq!(
            table.insert(ch("in"), Destination::new(&a, ch("x"))),
            Insertion::AlreadyPresent
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_same_destination_under_different_inputs() {
        let a = MemorySink::new();
        let mut table = RouteTable::new();

        table.insert(ch("p"), Destination::new(&a, ch("x")));
        table.insert(ch("q"), Destination::new(&a, ch("x")));
        assert_eq!(table.len(), 2);
        assert_eq!(table.channel_count(), 2);
    }

    #[test]
    fn test_remove_last_route_drops_entry() {
        let a = MemorySink::new();
        let mut table = RouteTable::new();
        let dest = Destination::new(&a, ch("x"));

        table.insert(ch("in"), dest.clone());
        assert!(table.has_routes(&ch("in")));
        assert!(table.remove(&ch("in"), &dest));
        assert!(!table.has_routes(&ch("in")));
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let mut table = RouteTable::new();
        table.insert(ch("in"), Destination::new(&a, ch("x")));

        assert!(!table.remove(&ch("in"), &Destination::new(&b, ch("x"))));
        assert!(!table.remove(&ch("in"), &Destination::new(&a, ch("y"))));
        assert!(!table.remove(&ch("other"), &Destination::new(&a, ch("x"))));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_iter_is_sorted_by_input() {
        let a = MemorySink::new();
        let mut table = RouteTable::new();
        table.insert(ch("z"), Destination::new(&a, ch("1")));
        table.insert(ch("a"), Destination::new(&a, ch("2")));

        let inputs: Vec<_> = table.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(inputs, vec![ch("a"), ch("z")]);
    }

    proptest::proptest! {
        #[test]
        fn no_duplicates_after_any_inserts(outputs in proptest::collection::vec(0u8..4, 0..32)) {
            let a = MemorySink::new();
            let mut table = RouteTable::new();
            let mut expected = Vec::new();
            for out in outputs {
                let channel = ChannelId::from(vec![out]);
                let fresh = !expected.contains(&channel);
                let inserted = table.insert(ch("in"), Destination::new(&a, channel.clone()));
                proptest::prop_assert_eq!(inserted == Insertion::Added, fresh);
                if fresh {
                    expected.push(channel);
                }
            }
            let got: Vec<_> = table.get(&ch("in")).iter().map(|d| d.channel().clone()).collect();
            proptest::prop_assert_eq!(got, expected);
        }
    }
}
