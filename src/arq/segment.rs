//! Message segmentation and reassembly.
//!
//! A message travels with its NUL terminator, which counts toward its length.
//! Messages that fit in one payload go out as a single `Unsegmented` frame;
//! longer ones become `Head`, zero or more full `Middle` chunks, and a `Tail`
//! holding the remainder.

use crate::core::{PAYLOAD_SIZE, PeerId};
use crate::transport::{Frame, Segment};

/// Split `message` into unstamped data frames from `src` to `dst`.
///
/// `message` must not contain NUL bytes; the terminator is appended here.
pub fn segment(src: PeerId, dst: PeerId, message: &[u8]) -> Vec<Frame> {
    let mut bytes = Vec::with_capacity(message.len() + 1);
    bytes.extend_from_slice(message);
    bytes.push(0);

    if bytes.len() <= PAYLOAD_SIZE {
        return vec![Frame::data(src, dst, Segment::Unsegmented, &bytes)];
    }

    let mut frames = Vec::with_capacity(bytes.len().div_ceil(PAYLOAD_SIZE));
    frames.push(Frame::data(src, dst, Segment::Head, &bytes[..PAYLOAD_SIZE]));

    let mut offset = PAYLOAD_SIZE;
    while offset + PAYLOAD_SIZE < bytes.len() {
        frames.push(Frame::data(
            src,
            dst,
            Segment::Middle,
            &bytes[offset..offset + PAYLOAD_SIZE],
        ));
        offset += PAYLOAD_SIZE;
    }

    frames.push(Frame::data(src, dst, Segment::Tail, &bytes[offset..]));
    frames
}

/// Rebuilds messages from the in-order frame stream of one source peer.
#[derive(Debug, Default)]
pub struct Reassembler {
    partial: Option<Vec<u8>>,
}

impl Reassembler {
    /// Create an idle reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while a segmented message is partly received.
    pub fn in_progress(&self) -> bool {
        self.partial.is_some()
    }

    /// Feed the next delivered frame; returns a message once one completes.
    ///
    /// A new `Head` or `Unsegmented` frame arriving mid-message discards the
    /// partial message. `Middle` and `Tail` frames with no preceding `Head`
    /// are dropped.
    pub fn push(&mut self, frame: &Frame) -> Option<String> {
        match frame.segment() {
            Segment::Unsegmented => {
                self.abandon(frame);
                Some(text(frame.payload_text()))
            }
            Segment::Head => {
                self.abandon(frame);
                self.partial = Some(frame.payload.to_vec());
                None
            }
            Segment::Middle => {
                match self.partial.as_mut() {
                    Some(buf) => buf.extend_from_slice(&frame.payload),
                    None => tracing::warn!(
                        src = %frame.src,
                        seq = frame.seq,
                        "middle segment without head"
                    ),
                }
                None
            }
            Segment::Tail => match self.partial.take() {
                Some(mut buf) => {
                    buf.extend_from_slice(frame.payload_text());
                    Some(text(&buf))
                }
                None => {
                    tracing::warn!(src = %frame.src, seq = frame.seq, "tail segment without head");
                    None
                }
            },
        }
    }

    fn abandon(&mut self, frame: &Frame) {
        if let Some(buf) = self.partial.take() {
            tracing::warn!(
                src = %frame.src,
                seq = frame.seq,
                discarded = buf.len(),
                "incomplete message discarded"
            );
        }
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
