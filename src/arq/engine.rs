//! Per-entity ARQ engine.
//!
//! [`ArqEngine`] owns one [`SenderWindow`], one [`ReceiverWindow`] and one
//! [`Reassembler`] per peer and turns inbound frames, user commands and clock
//! readings into outgoing frames. It is fully synchronous: whoever drives it
//! supplies the current time and transmits what it produces.

use std::time::Instant;

use super::config::LinkConfig;
use super::receiver::{Placement, ReceiverWindow};
use super::segment::{Reassembler, segment};
use super::sender::{AckOutcome, SenderWindow};
use crate::core::{ConfigError, LinkResult, PeerId, UpperLayer};
use crate::transport::{Frame, FrameError};

/// Counters describing link activity since the engine was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Data frames transmitted for the first time.
    pub frames_sent: u64,
    /// Data frames transmitted again after their timer expired.
    pub retransmissions: u64,
    /// Acknowledgments transmitted.
    pub acks_sent: u64,
    /// Acknowledgments that changed sender state.
    pub acks_received: u64,
    /// Frames that failed the CRC check.
    pub corrupted: u64,
    /// Intact frames addressed elsewhere or from an unknown source.
    pub misdirected: u64,
    /// Frames of the wrong length or with reserved flag bits set.
    pub malformed: u64,
    /// Data frames or acks that had already been seen.
    pub duplicates: u64,
    /// Messages handed to the upper layer.
    pub messages_delivered: u64,
}

/// Selective-repeat state for one entity and all of its peers.
#[derive(Debug)]
pub struct ArqEngine {
    config: LinkConfig,
    senders: Vec<SenderWindow>,
    receivers: Vec<ReceiverWindow>,
    reassemblers: Vec<Reassembler>,
    stats: LinkStats,
}

impl ArqEngine {
    /// Create an engine with fresh windows for every peer in `config`.
    pub fn new(config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let peers = (0..config.peer_count).map(|i| PeerId(i as u8));
        let senders = peers
            .clone()
            .map(|peer| SenderWindow::new(peer, config.rto))
            .collect();
        let receivers = peers.map(ReceiverWindow::new).collect();
        let reassemblers = (0..config.peer_count).map(|_| Reassembler::new()).collect();

        Ok(Self {
            config,
            senders,
            receivers,
            reassemblers,
            stats: LinkStats::default(),
        })
    }

    /// The configuration this engine was built from.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// This entity's id.
    pub fn self_id(&self) -> PeerId {
        self.config.self_id
    }

    /// Activity counters.
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Send-side window towards `peer`.
    pub fn sender(&self, peer: PeerId) -> Option<&SenderWindow> {
        self.remote(peer).map(|i| &self.senders[i])
    }

    /// Receive-side window for frames from `peer`.
    pub fn receiver(&self, peer: PeerId) -> Option<&ReceiverWindow> {
        self.remote(peer).map(|i| &self.receivers[i])
    }

    /// `true` when no frame is buffered or waiting towards any peer.
    pub fn is_idle(&self) -> bool {
        self.senders.iter().all(SenderWindow::is_idle)
    }

    /// Decode and process one frame received from the channel.
    ///
    /// Undecodable frames are counted and dropped. Acks for received data are
    /// appended to `out`; completed messages go to `upper`.
    pub fn on_raw_frame(
        &mut self,
        bytes: &[u8],
        upper: &mut dyn UpperLayer,
        out: &mut Vec<Frame>,
    ) {
        match Frame::from_bytes(bytes) {
            Ok(frame) => self.on_frame(frame, upper, out),
            Err(FrameError::Corrupted) => {
                self.stats.corrupted += 1;
                tracing::trace!("dropping corrupted frame");
            }
            Err(err) => {
                self.stats.malformed += 1;
                tracing::debug!(error = %err, "dropping malformed frame");
            }
        }
    }

    /// Process one intact frame.
    pub fn on_frame(&mut self, frame: Frame, upper: &mut dyn UpperLayer, out: &mut Vec<Frame>) {
        if frame.dst != self.config.self_id {
            self.stats.misdirected += 1;
            return;
        }
        let Some(index) = self.remote(frame.src) else {
            self.stats.misdirected += 1;
            tracing::debug!(src = %frame.src, "frame from unknown peer");
            return;
        };

        if frame.is_ack() {
            self.on_ack(index, frame.ack);
        } else {
            self.on_data(index, frame, upper, out);
        }
    }

    fn on_ack(&mut self, index: usize, ack: u8) {
        match self.senders[index].on_ack(ack) {
            AckOutcome::Slid(_) | AckOutcome::Held => self.stats.acks_received += 1,
            AckOutcome::Duplicate => self.stats.duplicates += 1,
            AckOutcome::Unsent | AckOutcome::OutOfWindow => {
                tracing::trace!(peer = index, ack, "ignoring ack outside window");
            }
        }
    }

    fn on_data(
        &mut self,
        index: usize,
        frame: Frame,
        upper: &mut dyn UpperLayer,
        out: &mut Vec<Frame>,
    ) {
        let placement = self.receivers[index].place(frame);

        if placement.should_ack() {
            out.push(Frame::ack(self.config.self_id, frame.src, frame.seq));
            self.stats.acks_sent += 1;
        }

        match placement {
            Placement::Accepted { delivered } => {
                let reassembler = &mut self.reassemblers[index];
                for piece in &delivered {
                    if let Some(message) = reassembler.push(piece) {
                        self.stats.messages_delivered += 1;
                        upper.deliver(frame.src, message);
                    }
                }
            }
            Placement::Duplicate | Placement::Stale => self.stats.duplicates += 1,
            Placement::OutOfWindow => {}
        }
    }

    /// Validate a user command, segment it, and queue the frames.
    ///
    /// Returns the number of frames queued. Nothing is transmitted until
    /// [`admit_all`](Self::admit_all) runs.
    pub fn submit(&mut self, src: PeerId, dst: PeerId, message: &str) -> LinkResult<usize> {
        self.config.check_command(src, dst, message)?;

        let frames = segment(src, dst, message.as_bytes());
        let count = frames.len();
        let window = &mut self.senders[dst.index()];
        for frame in frames {
            window.enqueue(frame);
        }

        tracing::debug!(dst = %dst, frames = count, "queued message");
        Ok(count)
    }

    /// Admit pending frames into every sender window, appending them to `out`.
    pub fn admit_all(&mut self, now: Instant, out: &mut Vec<Frame>) {
        for window in &mut self.senders {
            let admitted = window.admit(now);
            self.stats.frames_sent += admitted.len() as u64;
            out.extend(admitted);
        }
    }

    /// Collect expired frames from every sender window, appending them to `out`.
    pub fn check_timeouts(&mut self, now: Instant, out: &mut Vec<Frame>) {
        for window in &mut self.senders {
            let expired = window.check_timeouts(now);
            self.stats.retransmissions += expired.len() as u64;
            out.extend(expired);
        }
    }

    /// Earliest retransmission deadline across all peers, if any is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.senders.iter().filter_map(SenderWindow::next_expiry).min()
    }

    /// Window index for a remote peer.
    fn remote(&self, peer: PeerId) -> Option<usize> {
        self.config.is_remote_peer(peer).then(|| peer.index())
    }
}
