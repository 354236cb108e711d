//! Selective-repeat ARQ.
//!
//! This module holds the protocol state machines. Nothing here does I/O or
//! reads the clock; the [`endpoint`](crate::endpoint) worker (or a test)
//! drives an [`ArqEngine`] with frames, commands and timestamps.
//!
//! - [`SenderWindow`]: per-destination buffering, ack tracking and selective
//!   retransmission.
//! - [`ReceiverWindow`]: per-source out-of-order buffering and in-order release.
//! - [`segment`] / [`Reassembler`]: message splitting and rebuilding.
//! - [`ArqEngine`]: one entity's windows for all peers, plus [`LinkStats`].

mod config;
mod engine;
mod receiver;
mod segment;
mod sender;
pub mod sequence;

pub use config::{LinkConfig, LinkConfigBuilder};
pub use engine::{ArqEngine, LinkStats};
pub use receiver::{Placement, ReceiverWindow};
pub use segment::{Reassembler, segment};
pub use sender::{AckOutcome, SenderWindow};
