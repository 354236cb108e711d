//! Frame encoding and decoding for the srlink data link.
//!
//! Every frame is exactly [`FRAME_SIZE`] bytes:
//!
//! ```text
//! +-----+-----+-----+-----+------+--------------------+---------+
//! | src | dst | seq | ack | flag | payload            | fcs     |
//! | 1 B | 1 B | 1 B | 1 B | 1 B  | 57 B (zero-padded) | 2 B BE  |
//! +-----+-----+-----+-----+------+--------------------+---------+
//! ```
//!
//! The FCS is CRC16-CCITT over the first 62 bytes. A received frame is intact
//! iff the CRC over all 64 bytes is zero.

use thiserror::Error;

use super::crc::crc16_ccitt;
use crate::core::{
    FCS_SIZE, FLAG_ACK, FLAG_RESERVED_MASK, FLAG_SEGMENT_MASK, FLAG_SEG_HEAD, FLAG_SEG_MIDDLE,
    FLAG_SEG_TAIL, FLAG_SEG_UNSEGMENTED, FRAME_SIZE, HEADER_SIZE, PAYLOAD_SIZE, PeerId,
};

/// Segmentation role carried in the two low flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Segment {
    /// A chunk between head and tail.
    Middle = FLAG_SEG_MIDDLE,
    /// First chunk of a segmented message.
    Head = FLAG_SEG_HEAD,
    /// Last chunk of a segmented message.
    Tail = FLAG_SEG_TAIL,
    /// A whole message in one frame.
    Unsegmented = FLAG_SEG_UNSEGMENTED,
}

impl Segment {
    /// Extract the segmentation role from a flag byte.
    pub fn from_bits(byte: u8) -> Self {
        match byte & FLAG_SEGMENT_MASK {
            FLAG_SEG_MIDDLE => Self::Middle,
            FLAG_SEG_HEAD => Self::Head,
            FLAG_SEG_TAIL => Self::Tail,
            _ => Self::Unsegmented,
        }
    }

    /// Convert to the flag bits.
    pub fn as_bits(self) -> u8 {
        self as u8
    }
}

/// Frame flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// Create flags for a data frame with the given segmentation role.
    pub fn data(segment: Segment) -> Self {
        Self(segment.as_bits())
    }

    /// Flags for an acknowledgment frame.
    pub fn ack() -> Self {
        Self(FLAG_ACK)
    }

    /// Create flags from a raw byte.
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Get the raw byte value.
    pub fn as_byte(self) -> u8 {
        self.0
    }

    /// Segmentation role.
    pub fn segment(self) -> Segment {
        Segment::from_bits(self.0)
    }

    /// Check if the ACK flag is set.
    pub fn is_ack(self) -> bool {
        self.0 & FLAG_ACK != 0
    }

    /// Check if reserved bits are valid (must be zero).
    pub fn is_valid(self) -> bool {
        self.0 & FLAG_RESERVED_MASK == 0
    }
}

/// One link-layer frame.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Sending peer.
    pub src: PeerId,
    /// Receiving peer.
    pub dst: PeerId,
    /// Sequence number (assigned when admitted into a sender window).
    pub seq: u8,
    /// Acknowledged sequence number (ack frames only).
    pub ack: u8,
    /// Segmentation role and ACK bit.
    pub flags: FrameFlags,
    /// Fixed-size payload, zero-padded.
    pub payload: [u8; PAYLOAD_SIZE],
    /// Frame check sequence.
    pub fcs: u16,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("seq", &self.seq)
            .field("ack", &self.ack)
            .field("flags", &self.flags)
            .field("payload_len", &self.payload_text().len())
            .field("fcs", &format_args!("{:#06x}", self.fcs))
            .finish()
    }
}

impl Frame {
    /// Create an unstamped data frame carrying `chunk`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk` is longer than [`PAYLOAD_SIZE`].
    pub fn data(src: PeerId, dst: PeerId, segment: Segment, chunk: &[u8]) -> Self {
        assert!(
            chunk.len() <= PAYLOAD_SIZE,
            "chunk of {} bytes exceeds payload capacity {}",
            chunk.len(),
            PAYLOAD_SIZE
        );
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[..chunk.len()].copy_from_slice(chunk);
        Self {
            src,
            dst,
            seq: 0,
            ack: 0,
            flags: FrameFlags::data(segment),
            payload,
            fcs: 0,
        }
    }

    /// Create a stamped acknowledgment for sequence number `ack`.
    pub fn ack(src: PeerId, dst: PeerId, ack: u8) -> Self {
        let mut frame = Self {
            src,
            dst,
            seq: 0,
            ack,
            flags: FrameFlags::ack(),
            payload: [0u8; PAYLOAD_SIZE],
            fcs: 0,
        };
        frame.stamp();
        frame
    }

    /// Check if this is an acknowledgment frame.
    pub fn is_ack(&self) -> bool {
        self.flags.is_ack()
    }

    /// Segmentation role of this frame.
    pub fn segment(&self) -> Segment {
        self.flags.segment()
    }

    /// Payload bytes up to the first NUL (the implicit length).
    pub fn payload_text(&self) -> &[u8] {
        let end = self
            .payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PAYLOAD_SIZE);
        &self.payload[..end]
    }

    /// Compute and store the FCS over every other field.
    pub fn stamp(&mut self) {
        let bytes = self.to_bytes();
        self.fcs = compute_fcs(&bytes[..FRAME_SIZE - FCS_SIZE]);
    }

    /// Serialize to the fixed wire layout.
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        let mut buf = [0u8; FRAME_SIZE];
        buf[0] = self.src.as_byte();
        buf[1] = self.dst.as_byte();
        buf[2] = self.seq;
        buf[3] = self.ack;
        buf[4] = self.flags.as_byte();
        buf[HEADER_SIZE..HEADER_SIZE + PAYLOAD_SIZE].copy_from_slice(&self.payload);
        buf[FRAME_SIZE - FCS_SIZE..].copy_from_slice(&self.fcs.to_be_bytes());
        buf
    }

    /// Parse and verify a received frame.
    ///
    /// Rejects frames of the wrong size, frames failing the CRC check, and
    /// frames with reserved flag bits set.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != FRAME_SIZE {
            return Err(FrameError::WrongLength {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        if is_corrupted(bytes) {
            return Err(FrameError::Corrupted);
        }

        let flags = FrameFlags::from_byte(bytes[4]);
        if !flags.is_valid() {
            return Err(FrameError::InvalidFlags(bytes[4]));
        }

        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&bytes[HEADER_SIZE..HEADER_SIZE + PAYLOAD_SIZE]);
        let fcs = u16::from_be_bytes([bytes[FRAME_SIZE - 2], bytes[FRAME_SIZE - 1]]);

        Ok(Self {
            src: PeerId(bytes[0]),
            dst: PeerId(bytes[1]),
            seq: bytes[2],
            ack: bytes[3],
            flags,
            payload,
            fcs,
        })
    }
}

/// Compute the FCS for the frame bytes that precede the FCS field.
pub fn compute_fcs(bytes_without_fcs: &[u8]) -> u16 {
    crc16_ccitt(bytes_without_fcs)
}

/// Check a received frame, FCS included, for corruption.
pub fn is_corrupted(frame_bytes: &[u8]) -> bool {
    crc16_ccitt(frame_bytes) != 0
}

/// Errors that can occur during frame parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame is not exactly [`FRAME_SIZE`] bytes.
    #[error("wrong frame length: expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Required size.
        expected: usize,
        /// Actual size received.
        actual: usize,
    },

    /// CRC check failed.
    #[error("frame check sequence mismatch")]
    Corrupted,

    /// Invalid flags (reserved bits set).
    #[error("invalid flags: 0x{0:02x} (reserved bits must be 0)")]
    InvalidFlags(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_frame() -> Frame {
        let mut frame = Frame::data(PeerId(1), PeerId(2), Segment::Unsegmented, b"hello\0");
        frame.seq = 7;
        frame.stamp();
        frame
    }

    #[test]
    fn test_sizes() {
        assert_eq!(HEADER_SIZE, 5);
        assert_eq!(PAYLOAD_SIZE, 57);
        assert_eq!(HEADER_SIZE + PAYLOAD_SIZE + FCS_SIZE, FRAME_SIZE);
    }

    #[test]
    fn test_segment_bits() {
        for s in [
            Segment::Middle,
            Segment::Head,
            Segment::Tail,
            Segment::Unsegmented,
        ] {
            assert_eq!(Segment::from_bits(s.as_bits()), s);
            // ACK bit does not disturb the role bits
            assert_eq!(Segment::from_bits(s.as_bits() | FLAG_ACK), s);
        }
    }

    #[test]
    fn test_frame_flags() {
        let flags = FrameFlags::data(Segment::Head);
        assert!(!flags.is_ack());
        assert_eq!(flags.segment(), Segment::Head);
        assert!(flags.is_valid());

        let flags = FrameFlags::ack();
        assert!(flags.is_ack());
        assert!(flags.is_valid());

        assert!(!FrameFlags::from_byte(0x08).is_valid());
    }

    #[test]
    fn test_wire_layout() {
        let frame = sample_frame();
        let bytes = frame.to_bytes();

        assert_eq!(hex::encode(&bytes[..HEADER_SIZE]), "0102070003");
        assert_eq!(&bytes[HEADER_SIZE..HEADER_SIZE + 6], b"hello\0");
        assert!(bytes[HEADER_SIZE + 6..FRAME_SIZE - FCS_SIZE].iter().all(|&b| b == 0));
        assert_eq!(
            hex::encode(&bytes[FRAME_SIZE - FCS_SIZE..]),
            format!("{:04x}", frame.fcs)
        );
    }

    #[test]
    fn test_stamped_frame_is_intact() {
        let frame = sample_frame();
        assert!(!is_corrupted(&frame.to_bytes()));
        assert_eq!(
            frame.fcs,
            compute_fcs(&frame.to_bytes()[..FRAME_SIZE - FCS_SIZE])
        );
    }

    #[test]
    fn test_unstamped_frame_is_corrupted() {
        let frame = Frame::data(PeerId(1), PeerId(2), Segment::Unsegmented, b"x");
        assert!(matches!(
            Frame::from_bytes(&frame.to_bytes()),
            Err(FrameError::Corrupted)
        ));
    }

    #[test]
    fn test_parse_roundtrip() {
        let frame = sample_frame();
        let parsed = Frame::from_bytes(&frame.to_bytes()).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(parsed.payload_text(), b"hello");
    }

    #[test]
    fn test_ack_frame() {
        let frame = Frame::ack(PeerId(2), PeerId(1), 200);
        let parsed = Frame::from_bytes(&frame.to_bytes()).unwrap();
        assert!(parsed.is_ack());
        assert_eq!(parsed.ack, 200);
        assert_eq!(parsed.src, PeerId(2));
        assert_eq!(parsed.dst, PeerId(1));
    }

    #[test]
    fn test_parse_wrong_length() {
        let data = [0u8; 10];
        assert!(matches!(
            Frame::from_bytes(&data),
            Err(FrameError::WrongLength {
                expected: FRAME_SIZE,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_parse_invalid_flags() {
        let mut frame = sample_frame();
        frame.flags = FrameFlags::from_byte(0x83);
        frame.stamp();
        assert!(matches!(
            Frame::from_bytes(&frame.to_bytes()),
            Err(FrameError::InvalidFlags(0x83))
        ));
    }

    #[test]
    fn test_payload_text_full_chunk() {
        let chunk = [b'a'; PAYLOAD_SIZE];
        let frame = Frame::data(PeerId(0), PeerId(1), Segment::Head, &chunk);
        assert_eq!(frame.payload_text().len(), PAYLOAD_SIZE);
    }

    #[test]
    #[should_panic(expected = "exceeds payload capacity")]
    fn test_oversized_chunk_panics() {
        let chunk = [b'a'; PAYLOAD_SIZE + 1];
        let _ = Frame::data(PeerId(0), PeerId(1), Segment::Head, &chunk);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn test_stamped_frames_are_intact(
            src in any::<u8>(),
            dst in any::<u8>(),
            seq in any::<u8>(),
            role in 0u8..4,
            chunk in proptest::collection::vec(any::<u8>(), 0..=PAYLOAD_SIZE),
        ) {
            let mut frame = Frame::data(PeerId(src), PeerId(dst), Segment::from_bits(role), &chunk);
            frame.seq = seq;
            frame.stamp();
            prop_assert!(!is_corrupted(&frame.to_bytes()));
        }

        #[test]
        fn test_every_single_bit_flip_is_detected(
            seq in any::<u8>(),
            chunk in proptest::collection::vec(any::<u8>(), 0..=PAYLOAD_SIZE),
        ) {
            let mut frame = Frame::data(PeerId(3), PeerId(4), Segment::Unsegmented, &chunk);
            frame.seq = seq;
            frame.stamp();
            let bytes = frame.to_bytes();

            for bit in 0..FRAME_SIZE * 8 {
                let mut flipped = bytes;
                flipped[bit / 8] ^= 1 << (bit % 8);
                prop_assert!(is_corrupted(&flipped), "bit {} not detected", bit);
            }
        }
    }
}
