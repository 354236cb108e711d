//! Modulo-256 sequence arithmetic shared by both window halves.
//!
//! Sequence numbers are single bytes, so wrapping `u8` arithmetic is exactly
//! arithmetic modulo the sequence space.

use crate::core::WINDOW_SIZE;

/// Distance from `base` forward to `seq`, modulo the sequence space.
#[inline]
pub fn window_offset(seq: u8, base: u8) -> usize {
    seq.wrapping_sub(base) as usize
}

/// `true` when `seq` falls inside the window starting at `base`.
#[inline]
pub fn in_window(seq: u8, base: u8) -> bool {
    window_offset(seq, base) < WINDOW_SIZE
}

/// `true` when `seq` falls inside the window that ended just before `base`.
#[inline]
pub fn in_previous_window(seq: u8, base: u8) -> bool {
    let behind = base.wrapping_sub(seq) as usize;
    (1..=WINDOW_SIZE).contains(&behind)
}

/// Sequence number `offset` steps after `base`.
#[inline]
pub fn seq_add(base: u8, offset: usize) -> u8 {
    base.wrapping_add(offset as u8)
}

/// Ring buffer slot holding sequence number `seq`.
///
/// Valid because [`WINDOW_SIZE`] divides the sequence space: consecutive
/// sequence numbers map to consecutive slots across the wrap.
#[inline]
pub fn slot_of(seq: u8) -> usize {
    seq as usize % WINDOW_SIZE
}
