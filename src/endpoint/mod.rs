//! srlink - Async endpoint.
//!
//! Runs one [`ArqEngine`](crate::arq::ArqEngine) per entity on a Tokio task.
//! Inbound frames and user commands arrive over unbounded queues; the worker
//! sleeps until the first event or the nearest retransmission deadline.
//!
//! ```text
//! channel ──push_frame──┐
//!                       ├──▶ worker ──transmit──▶ channel
//! user ──submit_command─┘      │
//!                              └──deliver──▶ upper layer
//! ```

#[allow(clippy::module_inception)]
mod endpoint;
mod worker;

pub use endpoint::*;
