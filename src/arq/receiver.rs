//! Selective-repeat receive-side state machine.
//!
//! [`ReceiverWindow`] holds frames that arrive out of order and releases the
//! longest contiguous run starting at `left` as soon as it exists.

use super::sequence::{in_previous_window, seq_add, slot_of, window_offset};
use crate::core::{PeerId, WINDOW_SIZE};
use crate::transport::Frame;

/// What happened to a data frame handed to [`ReceiverWindow::place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Buffered. `delivered` holds the contiguous run now released, in
    /// sequence order (empty while a gap remains).
    Accepted {
        /// Frames released for reassembly.
        delivered: Vec<Frame>,
    },
    /// Already buffered and awaiting delivery.
    Duplicate,
    /// Retransmission of a frame from the window that was already delivered.
    Stale,
    /// Outside both the current and the previous window.
    OutOfWindow,
}

impl Placement {
    /// Whether the sender should be told this sequence number arrived.
    ///
    /// Duplicates and stale frames are acknowledged again: the first ack for
    /// them may have been lost.
    pub fn should_ack(&self) -> bool {
        !matches!(self, Self::OutOfWindow)
    }
}

/// Receive-side sliding window for one source peer.
#[derive(Debug)]
pub struct ReceiverWindow {
    peer: PeerId,
    /// Next sequence number expected for in-order delivery.
    left: u8,
    /// Ring of buffered frames, indexed by `seq % WINDOW_SIZE`.
    slots: [Option<Frame>; WINDOW_SIZE],
}

impl ReceiverWindow {
    /// Create an empty window for frames from `peer`, expecting sequence 0.
    pub fn new(peer: PeerId) -> Self {
        Self::starting_at(peer, 0)
    }

    /// Create an empty window expecting sequence `left` first.
    pub fn starting_at(peer: PeerId, left: u8) -> Self {
        Self {
            peer,
            left,
            slots: [None; WINDOW_SIZE],
        }
    }

    /// Source peer.
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Next sequence number expected for in-order delivery.
    pub fn left(&self) -> u8 {
        self.left
    }

    /// Number of frames buffered behind a gap.
    pub fn buffered(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Place a data frame and release any contiguous run it completes.
    pub fn place(&mut self, frame: Frame) -> Placement {
        let seq = frame.seq;
        let index = window_offset(seq, self.left);

        if index >= WINDOW_SIZE {
            if in_previous_window(seq, self.left) {
                tracing::trace!(peer = %self.peer, seq, left = self.left, "stale frame");
                return Placement::Stale;
            }
            tracing::trace!(peer = %self.peer, seq, left = self.left, "frame outside window");
            return Placement::OutOfWindow;
        }

        let slot = &mut self.slots[slot_of(seq)];
        if slot.is_some() {
            return Placement::Duplicate;
        }
        *slot = Some(frame);

        Placement::Accepted {
            delivered: self.release(),
        }
    }

    /// Drain the contiguous run starting at `left` and advance past it.
    fn release(&mut self) -> Vec<Frame> {
        let mut delivered = Vec::new();
        while let Some(frame) = self.slots[slot_of(self.left)].take() {
            delivered.push(frame);
            self.left = seq_add(self.left, 1);
        }

        if !delivered.is_empty() {
            tracing::debug!(
                peer = %self.peer,
                run = delivered.len(),
                left = self.left,
                "receiver window slid"
            );
        }
        delivered
    }
}
