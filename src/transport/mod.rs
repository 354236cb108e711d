//! srlink - Frame codec
//!
//! This module implements the wire layer of the link:
//!
//! - **Frame encoding/decoding**: [`Frame`], [`FrameFlags`], [`Segment`]
//! - **Integrity**: CRC16-CCITT frame check sequence ([`compute_fcs`],
//!   [`is_corrupted`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Segmentation / Reassembly        │
//! ├─────────────────────────────────────────┤
//! │     Sender / Receiver windows (ARQ)     │
//! ├─────────────────────────────────────────┤
//! │            Frame codec                  │  ← This module
//! │      fixed 64-byte frames, CRC16        │
//! ├─────────────────────────────────────────┤
//! │        Unreliable shared channel        │
//! └─────────────────────────────────────────┘
//! ```

mod crc;
mod frame;

pub use crc::crc16_ccitt;
pub use frame::*;
