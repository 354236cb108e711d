//! Protocol constants for the srlink data link.
//!
//! These values are fixed by the wire format and MUST NOT be changed
//! independently of each other.

use std::time::Duration;

// =============================================================================
// FRAME LAYOUT
// =============================================================================

/// Total size of every frame on the wire.
pub const FRAME_SIZE: usize = 64;

/// Source peer id field size.
pub const SRC_SIZE: usize = 1;

/// Destination peer id field size.
pub const DST_SIZE: usize = 1;

/// Sequence number field size.
pub const SEQ_SIZE: usize = 1;

/// Acknowledgment number field size.
pub const ACK_SIZE: usize = 1;

/// Flag field size.
pub const FLAG_SIZE: usize = 1;

/// Frame check sequence (CRC16) field size.
pub const FCS_SIZE: usize = 2;

/// Header size (everything before the payload).
pub const HEADER_SIZE: usize = SRC_SIZE + DST_SIZE + SEQ_SIZE + ACK_SIZE + FLAG_SIZE;

/// Payload capacity of a single frame.
pub const PAYLOAD_SIZE: usize = FRAME_SIZE - HEADER_SIZE - FCS_SIZE;

// =============================================================================
// FRAME FLAGS
// =============================================================================

/// Mask selecting the segmentation role bits.
pub const FLAG_SEGMENT_MASK: u8 = 0x03;

/// Segmentation role: middle chunk.
pub const FLAG_SEG_MIDDLE: u8 = 0x00;

/// Segmentation role: first chunk.
pub const FLAG_SEG_HEAD: u8 = 0x01;

/// Segmentation role: last chunk.
pub const FLAG_SEG_TAIL: u8 = 0x02;

/// Segmentation role: whole message in one frame.
pub const FLAG_SEG_UNSEGMENTED: u8 = 0x03;

/// Frame is an acknowledgment, not payload.
pub const FLAG_ACK: u8 = 0x04;

/// Bits that must be zero on the wire.
pub const FLAG_RESERVED_MASK: u8 = 0xF8;

// =============================================================================
// SEQUENCE SPACE AND WINDOW
// =============================================================================

/// Number of distinct sequence numbers (one byte).
pub const SEQ_SPACE: usize = 1 << (SEQ_SIZE * 8);

/// Sliding window size, shared by sender and receiver.
pub const WINDOW_SIZE: usize = 8;

// Selective repeat needs the window to fit in half the sequence space, and the
// ring buffers index slots by `seq % WINDOW_SIZE`.
const _: () = assert!(WINDOW_SIZE <= SEQ_SPACE / 2);
const _: () = assert!(SEQ_SPACE % WINDOW_SIZE == 0);

// =============================================================================
// TIMING
// =============================================================================

/// Retransmission timeout per buffered frame.
pub const DEFAULT_RTO: Duration = Duration::from_millis(100);

/// How long the worker waits when no timer is armed.
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(100);

// =============================================================================
// PEER TABLE
// =============================================================================

/// Largest peer table an entity can address (peer ids are one byte).
pub const MAX_PEERS: usize = 256;
