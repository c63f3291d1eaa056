//! Default routes.

use crate::destination::Destination;
use crate::table::Insertion;

/// Destinations receiving traffic from any input channel without a specific
/// route. Ordered and duplicate-free, like each list in the route table.
#[derive(Debug, Clone, Default)]
pub struct DefaultRouteList<'a> {
    routes: Vec<Destination<'a>>,
}

impl<'a> DefaultRouteList<'a> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append `destination` unless already present.
    pub fn insert(&mut self, destination: Destination<'a>) -> Insertion {
        if self.routes.contains(&destination) {
            return Insertion::AlreadyPresent;
        }
        self.routes.push(destination);
        Insertion::Added
    }

    /// Remove the destination equal to `destination`.
    pub fn remove(&mut self, destination: &Destination<'_>) -> bool {
        match self.routes.iter().position(|d| d == destination) {
            Some(index) => {
                self.routes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether an equal destination is present.
    pub fn contains(&self, destination: &Destination<'_>) -> bool {
        self.routes.iter().any(|d| d == destination)
    }

    /// Destinations in insertion order.
    pub fn as_slice(&self) -> &[Destination<'a>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanswitch_core::{ChannelId, MemorySink};

    #[test]
    fn test_insert_and_remove() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let mut list = DefaultRouteList::new();

        assert_eq!(list.insert(Destination::new(&a, ChannelId::DEFAULT)), Insertion::Added);
        assert_eq!(list.insert(Destination::new(&b, ChannelId::DEFAULT)), Insertion::Added);
        assert_eq!(
            list.insert(Destination::new(&a, ChannelId::DEFAULT)),
            Insertion::AlreadyPresent
        );
        assert_eq!(list.len(), 2);

        assert!(list.remove(&Destination::new(&a, ChannelId::DEFAULT)));
        assert!(!list.remove(&Destination::new(&a, ChannelId::DEFAULT)));
        assert_eq!(list.len(), 1);
        assert!(list.as_slice()[0].targets(&b));
    }

    #[test]
    fn test_same_sink_different_channels_are_distinct() {
        let a = MemorySink::new();
        let mut list = DefaultRouteList::new();
        list.insert(Destination::new(&a, ChannelId::from("x")));
        list.insert(Destination::new(&a, ChannelId::from("y")));
        assert_eq!(list.len(), 2);

        assert!(list.remove(&Destination::new(&a, ChannelId::from("y"))));
        assert!(list.contains(&Destination::new(&a, ChannelId::from("x"))));
    }
}
