//! # Chanswitch
//!
//! A channel switch for byte-stream pipelines.
//!
//! ## Overview
//!
//! Bytes enter the switch tagged with an input channel. The switch looks up
//! the routes for that channel and forwards the bytes, in route order, to
//! each destination sink on the destination's output channel. Message-end,
//! flush and message-series-end signals follow the same routes.
//!
//! - **Specific routes** map one input channel to one or more destinations
//! - **Default routes** catch every input channel without a specific route
//! - **Backpressure** suspends a fan-out; repeating the call resumes it
//!
//! The switch is itself a [`Sink`](chanswitch_core::Sink), so switches chain.
//!
//! ## Usage
//!
//! ```rust
//! use chanswitch::{ChannelSwitch, Outcome};
//! use chanswitch::core::{ChannelId, MemorySink};
//!
//! let d1 = MemorySink::new();
//! let d2 = MemorySink::new();
//!
//! let switch = ChannelSwitch::new();
//! switch.add_route("A", &d1, "x").unwrap();
//! switch.add_default_route_on(&d2, "y").unwrap();
//!
//! let outcome = switch.put(&ChannelId::from("A"), b"hello", true, false).unwrap();
//! assert_eq!(outcome, Outcome::Delivered);
//! assert_eq!(d1.data(&ChannelId::from("x")), b"hello");
//! assert!(d2.is_empty());
//! ```
//!
//! ## Re-exports
//!
//! - `chanswitch::core` - Channel identifiers, the sink contract, built-in sinks
//! - `chanswitch::route` - Route tables and resolution

pub mod config;
pub mod driver;
pub mod error;
pub mod resume;
pub mod switch;

pub use chanswitch_core as core;
pub use chanswitch_route as route;

pub use config::{PutSpacePolicy, RetryConfig, SwitchConfig};
pub use error::{Result, SwitchError};
pub use resume::{Operation, ResumeState, Stage};
pub use switch::{ChannelSwitch, Outcome};

pub use chanswitch_core::{ChannelId, FlushStatus, Propagation, Sink};
pub use chanswitch_route::{DuplicatePolicy, Insertion};
