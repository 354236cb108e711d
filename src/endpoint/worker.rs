//! The per-entity control loop.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::arq::{ArqEngine, LinkStats};
use crate::core::{Channel, PeerId, UpperLayer};
use crate::transport::Frame;

/// A user message waiting to be segmented.
#[derive(Debug)]
pub(super) struct Command {
    pub(super) src: PeerId,
    pub(super) dst: PeerId,
    pub(super) message: String,
}

/// Owns the engine and serializes every event that mutates it.
pub(super) struct Worker {
    pub(super) engine: ArqEngine,
    pub(super) channel: Arc<dyn Channel>,
    pub(super) upper: Box<dyn UpperLayer>,
    pub(super) frames: mpsc::UnboundedReceiver<Vec<u8>>,
    pub(super) commands: mpsc::UnboundedReceiver<Command>,
    pub(super) shutdown: oneshot::Receiver<()>,
}

impl Worker {
    /// Run until shutdown is requested, returning the final counters.
    ///
    /// Each pass waits for the first of: shutdown, an inbound frame, a user
    /// command, or the nearest retransmission deadline (the idle poll bound
    /// when no timer is armed). Everything queued is then drained and handled
    /// in one batch before the produced frames are transmitted in order.
    pub(super) async fn run(mut self) -> LinkStats {
        let self_id = self.engine.self_id();
        tracing::debug!(entity = %self_id, "link worker started");

        loop {
            let deadline = self.wake_deadline(Instant::now());

            let mut inbound = Vec::new();
            let mut commands = Vec::new();

            tokio::select! {
                biased;
                _ = &mut self.shutdown => break,
                Some(bytes) = self.frames.recv() => inbound.push(bytes),
                Some(command) = self.commands.recv() => commands.push(command),
                () = time::sleep_until(deadline) => {}
            }

            while let Ok(bytes) = self.frames.try_recv() {
                inbound.push(bytes);
            }
            while let Ok(command) = self.commands.try_recv() {
                commands.push(command);
            }

            let outgoing = self.step(inbound, commands);
            for frame in outgoing {
                self.channel.transmit(frame.to_bytes());
            }
        }

        let stats = *self.engine.stats();
        tracing::debug!(entity = %self_id, ?stats, "link worker stopped");
        stats
    }

    /// Nearest retransmission deadline over every peer, or `now` plus the
    /// idle poll interval when no timer is armed.
    fn wake_deadline(&self, now: Instant) -> Instant {
        self.engine
            .next_deadline()
            .map(Instant::from_std)
            .unwrap_or_else(|| now + self.engine.config().idle_poll)
    }

    /// Apply one batch of events and collect the frames to transmit.
    fn step(&mut self, inbound: Vec<Vec<u8>>, commands: Vec<Command>) -> Vec<Frame> {
        let now = Instant::now().into_std();
        let mut out = Vec::new();

        for bytes in &inbound {
            self.engine.on_raw_frame(bytes, self.upper.as_mut(), &mut out);
        }

        for Command { src, dst, message } in commands {
            if let Err(err) = self.engine.submit(src, dst, &message) {
                tracing::warn!(%src, %dst, error = %err, "rejected command");
            }
        }

        self.engine.admit_all(now, &mut out);
        self.engine.check_timeouts(now, &mut out);
        out
    }
}
