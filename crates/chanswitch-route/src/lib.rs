//! # Chanswitch Route
//!
//! Route tables for the channel switch.
//!
//! ## Overview
//!
//! A route sends traffic from an input channel to a [`Destination`]: a sink
//! plus the output channel to use on that sink. Routes live in two places:
//!
//! - [`RouteTable`] - Specific routes keyed by input channel
//! - [`DefaultRouteList`] - Routes for any input channel with no specific entry
//!
//! [`RouteSet`] owns both and resolves an input channel into a
//! [`RouteCursor`]: the specific routes if there are any, the default routes
//! otherwise. Specific routes fully shadow the defaults.
//!
//! ## Ordering
//!
//! Both collections preserve insertion order and never hold the same
//! destination twice, so fan-out order is deterministic and no destination
//! ever receives a byte range twice.
//!
//! ## Usage
//!
//! ```rust
//! use chanswitch_core::{ChannelId, MemorySink};
//! use chanswitch_route::{DuplicatePolicy, RouteSet};
//!
//! let d1 = MemorySink::new();
//! let d2 = MemorySink::new();
//!
//! let mut routes = RouteSet::new(DuplicatePolicy::Ignore);
//! routes.add_route("A".into(), &d1, "x".into()).unwrap();
//! routes.add_default_route(&d2, "y".into()).unwrap();
//!
//! let to_a: Vec<_> = routes.resolve(&"A".into()).map(|d| d.channel().clone()).collect();
//! assert_eq!(to_a, vec![ChannelId::from("x")]);
//!
//! let to_b: Vec<_> = routes.resolve(&"B".into()).map(|d| d.channel().clone()).collect();
//! assert_eq!(to_b, vec![ChannelId::from("y")]);
//! ```

pub mod cursor;
pub mod default;
pub mod destination;
pub mod error;
pub mod set;
pub mod table;

pub use cursor::{RouteCursor, RouteSource};
pub use default::DefaultRouteList;
pub use destination::Destination;
pub use error::{Result, RouteError};
pub use set::{DuplicatePolicy, RouteSet};
pub use table::{Insertion, RouteTable};
