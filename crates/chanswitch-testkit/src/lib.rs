//! # Chanswitch Testkit
//!
//! Testing utilities for chanswitch.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: [`SinkBank`], a set of recording sinks to route to
//! - **Generators**: Proptest strategies for channels, payloads and route scripts
//! - **Model**: [`RouteModel`], a naive reference for route resolution
//!
//! ## Property Testing
//!
//! Replay a generated route script onto a switch and the model, then compare:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use chanswitch::ChannelSwitch;
//! use chanswitch_testkit::{generators, RouteModel, SinkBank};
//!
//! proptest! {
//!     #[test]
//!     fn resolution_matches_model(script in generators::route_script(3, 20)) {
//!         let bank = SinkBank::new(3);
//!         let switch = ChannelSwitch::new();
//!         let mut model = RouteModel::new();
//!         for op in &script {
//!             bank.apply(&switch, op).ok();
//!             model.apply(op);
//!         }
//!         // compare switch.resolve_channels(..) with model.resolve(..)
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use chanswitch_testkit::SinkBank;
//!
//! let bank = SinkBank::new(2);
//! let switch = bank.fan_out("in", "out").unwrap();
//! switch.put(&"in".into(), b"hi", false, false).unwrap();
//! assert_eq!(bank.sink(1).data(&"out".into()), b"hi");
//! ```

pub mod fixtures;
pub mod generators;
pub mod model;

pub use fixtures::SinkBank;
pub use generators::RouteOp;
pub use model::RouteModel;
