//! # Chanswitch Core
//!
//! Primitives shared by every piece of a channel-switching pipeline.
//!
//! This crate has no routing logic. It defines what flows between pipeline
//! stages and the contract each stage implements.
//!
//! ## Key Types
//!
//! - [`ChannelId`] - Named logical sub-stream within one data flow
//! - [`Sink`] - The contract every pipeline stage implements
//! - [`Delivery`], [`Ack`], [`FlushStatus`] - Flow-control outcomes
//! - [`Propagation`] - How far a signal cascades through chained sinks
//!
//! ## Built-in Sinks
//!
//! - [`MemorySink`] - Records everything it sees; backpressure can be scripted
//! - [`QueueSink`] - Bounded `tokio` mpsc queue whose producers genuinely block
//! - [`WriterSink`] - Adapts any [`std::io::Write`]

pub mod channel;
pub mod error;
pub mod memory;
pub mod queue;
pub mod sink;
pub mod writer;

pub use channel::ChannelId;
pub use error::{Result, SinkError};
pub use memory::{MemorySink, SinkEvent};
pub use queue::{QueueItem, QueueSink};
pub use sink::{is_zero_sized, same_sink, Ack, Delivery, FlushStatus, Propagation, Sink};
pub use writer::WriterSink;
