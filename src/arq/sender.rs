//! Selective-repeat send-side state machine.
//!
//! [`SenderWindow`] buffers up to [`WINDOW_SIZE`] in-flight frames for one
//! destination peer. Each buffered frame carries its own retransmission
//! deadline; only frames whose deadline passes are resent.
//!
//! # Window layout
//!
//! ```text
//!   left                  left + in_flight       left + WINDOW_SIZE
//!    │                          │                        │
//! ───┼──────────────────────────┼────────────────────────┼──▶ seq space
//!    │ <── buffered (in flight) │ <── free slots ──────▶ │
//! ```
//!
//! Frames that do not fit wait in a FIFO and are admitted as acks free slots.
//! Slots live in a ring indexed by `seq % WINDOW_SIZE`, so sliding the window
//! only moves `left` and clears the vacated slots.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::sequence::{seq_add, slot_of, window_offset};
use crate::core::{PeerId, WINDOW_SIZE};
use crate::transport::Frame;

/// A buffered frame awaiting acknowledgment.
#[derive(Debug, Clone)]
struct SendSlot {
    /// Stamped frame exactly as first transmitted.
    frame: Frame,
    /// Whether the receiver has acknowledged this sequence number.
    acked: bool,
    /// Retransmission deadline.
    expiry: Instant,
    /// Number of times the frame has been transmitted.
    transmissions: u32,
}

/// Result of processing one acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The acked prefix grew and the window slid by this many slots.
    Slid(usize),
    /// Recorded, but an earlier slot is still unacknowledged.
    Held,
    /// The sequence number was already acknowledged.
    Duplicate,
    /// The sequence number is inside the window but nothing was sent there.
    Unsent,
    /// The sequence number is outside the window (late or bogus ack).
    OutOfWindow,
}

/// Send-side sliding window for one destination peer.
#[derive(Debug)]
pub struct SenderWindow {
    /// Destination peer.
    peer: PeerId,
    /// Sequence number of the oldest unacknowledged slot.
    left: u8,
    /// Number of occupied slots, starting at `left` (the first free index).
    in_flight: usize,
    /// Ring of buffered frames, indexed by `seq % WINDOW_SIZE`.
    slots: [Option<SendSlot>; WINDOW_SIZE],
    /// Frames waiting for a free slot.
    pending: VecDeque<Frame>,
    /// Retransmission timeout.
    rto: Duration,
}

impl SenderWindow {
    /// Create an empty window towards `peer`, starting at sequence 0.
    pub fn new(peer: PeerId, rto: Duration) -> Self {
        Self::starting_at(peer, rto, 0)
    }

    /// Create an empty window whose first frame will use sequence `left`.
    pub fn starting_at(peer: PeerId, rto: Duration, left: u8) -> Self {
        Self {
            peer,
            left,
            in_flight: 0,
            slots: std::array::from_fn(|_| None),
            pending: VecDeque::new(),
            rto,
        }
    }

    /// Destination peer.
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Sequence number of the oldest unacknowledged slot.
    pub fn left(&self) -> u8 {
        self.left
    }

    /// Number of buffered frames (the index of the first free slot).
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of frames waiting for a free slot.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// `true` when nothing is buffered or waiting.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.pending.is_empty()
    }

    /// Append a frame to the pending FIFO. Nothing is buffered yet.
    pub fn enqueue(&mut self, frame: Frame) {
        self.pending.push_back(frame);
    }

    /// Move pending frames into free slots.
    ///
    /// Each admitted frame gets the next sequence number, a fresh FCS and a
    /// retransmission deadline of `now + rto`. Returns the admitted frames in
    /// FIFO order, ready for transmission.
    pub fn admit(&mut self, now: Instant) -> Vec<Frame> {
        let mut admitted = Vec::new();

        while self.in_flight < WINDOW_SIZE {
            let Some(mut frame) = self.pending.pop_front() else {
                break;
            };

            let index = self.in_flight;
            frame.seq = seq_add(self.left, index);
            frame.stamp();

            *self.slot_mut(index) = Some(SendSlot {
                frame,
                acked: false,
                expiry: now + self.rto,
                transmissions: 1,
            });
            self.in_flight += 1;

            tracing::trace!(peer = %self.peer, seq = frame.seq, "admitted frame");
            admitted.push(frame);
        }

        debug_assert!(self.in_flight <= WINDOW_SIZE);
        admitted
    }

    /// Process an acknowledgment for sequence number `ack`.
    ///
    /// The window slides by the length of the contiguous acknowledged prefix,
    /// so acks that arrive beyond a gap are remembered but do not move `left`.
    pub fn on_ack(&mut self, ack: u8) -> AckOutcome {
        let index = window_offset(ack, self.left);
        if index >= WINDOW_SIZE {
            return AckOutcome::OutOfWindow;
        }
        if index >= self.in_flight {
            return AckOutcome::Unsent;
        }

        match self.slot_mut(index) {
            Some(slot) if slot.acked => return AckOutcome::Duplicate,
            Some(slot) => slot.acked = true,
            None => return AckOutcome::Unsent,
        }

        let slide = (0..self.in_flight)
            .take_while(|&i| self.slot(i).as_ref().is_some_and(|s| s.acked))
            .count();
        if slide == 0 {
            return AckOutcome::Held;
        }

        for i in 0..slide {
            *self.slot_mut(i) = None;
        }
        self.left = seq_add(self.left, slide);
        self.in_flight -= slide;

        tracing::debug!(peer = %self.peer, slide, left = self.left, "sender window slid");
        AckOutcome::Slid(slide)
    }

    /// Collect buffered, unacknowledged frames whose deadline has passed.
    ///
    /// Each expired frame is returned unchanged (same sequence number and
    /// FCS) and re-armed to `now + rto`. Frames are resent independently.
    pub fn check_timeouts(&mut self, now: Instant) -> Vec<Frame> {
        let rto = self.rto;
        let mut expired = Vec::new();

        for i in 0..self.in_flight {
            if let Some(slot) = self.slot_mut(i) {
                if !slot.acked && slot.expiry <= now {
                    slot.expiry = now + rto;
                    slot.transmissions += 1;
                    expired.push(slot.frame);
                }
            }
        }

        if !expired.is_empty() {
            tracing::debug!(
                peer = %self.peer,
                count = expired.len(),
                "retransmitting expired frames"
            );
        }
        expired
    }

    /// Earliest retransmission deadline among unacknowledged frames.
    pub fn next_expiry(&self) -> Option<Instant> {
        (0..self.in_flight)
            .filter_map(|i| self.slot(i).as_ref())
            .filter(|slot| !slot.acked)
            .map(|slot| slot.expiry)
            .min()
    }

    /// Retransmission deadline of the buffered frame with sequence `seq`.
    pub fn expiry_of(&self, seq: u8) -> Option<Instant> {
        self.buffered(seq).map(|slot| slot.expiry)
    }

    /// How many times the buffered frame with sequence `seq` was transmitted.
    pub fn transmissions_of(&self, seq: u8) -> Option<u32> {
        self.buffered(seq).map(|slot| slot.transmissions)
    }

    /// Look up an occupied slot by sequence number.
    fn buffered(&self, seq: u8) -> Option<&SendSlot> {
        let index = window_offset(seq, self.left);
        if index >= self.in_flight {
            return None;
        }
        self.slot(index).as_ref()
    }

    /// Slot at logical `index` from `left`.
    fn slot(&self, index: usize) -> &Option<SendSlot> {
        &self.slots[slot_of(seq_add(self.left, index))]
    }

    fn slot_mut(&mut self, index: usize) -> &mut Option<SendSlot> {
        &mut self.slots[slot_of(seq_add(self.left, index))]
    }
}
