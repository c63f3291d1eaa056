//! Route resolution cursor.
//!
//! A cursor is a single-pass view over the destinations resolved for one
//! input channel at one moment. It borrows the route tables, so they cannot
//! change underneath it; resolve again to observe later changes.

use crate::destination::Destination;

/// Which collection a cursor walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// Specific routes registered for the input channel.
    Specific,
    /// Default routes, because the input channel has no specific route.
    Default,
}

/// Ordered walk over resolved destinations.
#[derive(Debug, Clone)]
pub struct RouteCursor<'r, 'a> {
    source: RouteSource,
    destinations: &'r [Destination<'a>],
    next: usize,
}

impl<'r, 'a> RouteCursor<'r, 'a> {
    pub(crate) fn new(source: RouteSource, destinations: &'r [Destination<'a>]) -> Self {
        Self {
            source,
            destinations,
            next: 0,
        }
    }

    /// Which collection was resolved.
    pub fn source(&self) -> RouteSource {
        self.source
    }

    /// Total number of resolved destinations, visited or not.
    pub fn total(&self) -> usize {
        self.destinations.len()
    }

    /// Index of the destination the next call to `next` yields.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Skip ahead so the next destination yielded is the one at `index`.
    ///
    /// Never moves backwards; an index past the end exhausts the cursor.
    pub fn seek(&mut self, index: usize) {
        self.next = self.next.max(index.min(self.destinations.len()));
    }

    /// The only resolved destination, if exactly one was resolved.
    pub fn sole(&self) -> Option<&'r Destination<'a>> {
        match self.destinations {
            [only] => Some(only),
            _ => None,
        }
    }

    /// All resolved destinations, ignoring the cursor position.
    pub fn as_slice(&self) -> &'r [Destination<'a>] {
        self.destinations
    }
}

impl<'r, 'a> Iterator for RouteCursor<'r, 'a> {
    type Item = &'r Destination<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let destination = self.destinations.get(self.next)?;
        self.next += 1;
        Some(destination)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.destinations.len() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RouteCursor<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chanswitch_core::{ChannelId, MemorySink};

    #[test]
    fn test_walks_in_order_once() {
        let a = MemorySink::new();
        let list = vec![
            Destination::new(&a, ChannelId::from("1")),
            Destination::new(&a, ChannelId::from("2")),
        ];
        let mut cursor = RouteCursor::new(RouteSource::Specific, &list);

        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor.next().unwrap().channel(), &ChannelId::from("1"));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.next().unwrap().channel(), &ChannelId::from("2"));
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_seek() {
        let a = MemorySink::new();
        let list: Vec<_> = ["1", "2", "3"]
            .into_iter()
            .map(|c| Destination::new(&a, ChannelId::from(c)))
            .collect();
        let mut cursor = RouteCursor::new(RouteSource::Default, &list);

        cursor.seek(2);
        assert_eq!(cursor.next().unwrap().channel(), &ChannelId::from("3"));

        cursor.seek(0);
        assert!(cursor.next().is_none());

        let mut past = RouteCursor::new(RouteSource::Default, &list);
        past.seek(10);
        assert_eq!(past.position(), 3);
        assert!(past.next().is_none());
    }

    #[test]
    fn test_sole() {
        let a = MemorySink::new();
        let one = vec![Destination::new(&a, ChannelId::DEFAULT)];
        assert!(RouteCursor::new(RouteSource::Specific, &one).sole().is_some());

        let none: Vec<Destination<'_>> = Vec::new();
        assert!(RouteCursor::new(RouteSource::Default, &none).sole().is_none());

        let two = vec![
            Destination::new(&a, ChannelId::from("x")),
            Destination::new(&a, ChannelId::from("y")),
        ];
        assert!(RouteCursor::new(RouteSource::Specific, &two).sole().is_none());
    }
}
