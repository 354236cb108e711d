//! # srlink
//!
//! **S**elective-**R**epeat **link** layer.
//!
//! srlink turns an unreliable channel shared by numbered peers into reliable,
//! ordered message delivery between every pair of them. It provides:
//!
//! - **Framing**: fixed 64-byte frames protected by CRC16-CCITT
//! - **Segmentation**: messages of any length split into frame-sized chunks
//! - **Selective repeat**: per-peer sliding windows of 8 frames with
//!   per-frame retransmission timers
//! - **In-order delivery**: out-of-order arrivals are held until the gap fills
//!
//! ## Feature Flags
//!
//! - `endpoint` (default): Tokio worker task per entity
//! - `simulator` (default): lossy shared medium for tests and demos
//!
//! ## Modules
//!
//! - [`core`]: Constants, peer ids, error types and collaborator traits
//! - [`transport`]: Frame codec and CRC
//! - [`arq`]: Window state machines, segmentation and the per-entity engine
//! - [`endpoint`]: Async worker (requires `endpoint` feature)
//! - [`simulator`]: Simulated channel (requires `simulator` feature)
//!
//! ## Example Usage
//!
//! Driving the engines by hand, without a runtime:
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::time::Instant;
//! use srlink::prelude::*;
//!
//! let config = |id| LinkConfigBuilder::new().self_id(PeerId(id)).peer_count(2).build();
//! let mut alice = ArqEngine::new(config(0)?)?;
//! let mut bob = ArqEngine::new(config(1)?)?;
//!
//! let inbox = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&inbox);
//! let mut upper = move |from: PeerId, msg: String| sink.lock().unwrap().push((from, msg));
//!
//! alice.submit(PeerId(0), PeerId(1), "hello bob")?;
//! let mut wire = Vec::new();
//! alice.admit_all(Instant::now(), &mut wire);
//!
//! let mut acks = Vec::new();
//! for frame in &wire {
//!     bob.on_raw_frame(&frame.to_bytes(), &mut upper, &mut acks);
//! }
//! for ack in &acks {
//!     alice.on_raw_frame(&ack.to_bytes(), &mut |_: PeerId, _: String| {}, &mut Vec::new());
//! }
//!
//! assert!(alice.is_idle());
//! assert_eq!(*inbox.lock().unwrap(), vec![(PeerId(0), "hello bob".to_string())]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Frame codec (always included)
pub mod transport;

// Protocol state machines (always included)
pub mod arq;

// Async worker (feature-gated)
#[cfg(feature = "endpoint")]
#[cfg_attr(docsrs, doc(cfg(feature = "endpoint")))]
pub mod endpoint;

// Simulated channel (feature-gated)
#[cfg(feature = "simulator")]
#[cfg_attr(docsrs, doc(cfg(feature = "simulator")))]
pub mod simulator;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits and types
    pub use crate::core::*;

    pub use crate::arq::{ArqEngine, LinkConfig, LinkConfigBuilder, LinkStats};
    pub use crate::transport::{Frame, FrameError, Segment};

    #[cfg(feature = "endpoint")]
    pub use crate::endpoint::{Endpoint, EndpointHandle};

    #[cfg(feature = "simulator")]
    pub use crate::simulator::{MediumConfig, MediumStats, SharedMedium};
}

// Re-export commonly used items at crate root
pub use crate::core::{Channel, LinkError, LinkResult, PeerId, UpperLayer};

pub use crate::arq::{ArqEngine, LinkConfig, LinkConfigBuilder, LinkStats};

#[cfg(feature = "endpoint")]
pub use crate::endpoint::{Endpoint, EndpointHandle};
