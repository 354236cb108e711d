//! Endpoint handle and lifecycle.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::worker::{Command, Worker};
use crate::arq::{ArqEngine, LinkConfig, LinkStats};
use crate::core::{Channel, LinkError, LinkResult, PeerId, UpperLayer};

/// Cloneable handle for feeding an endpoint from other tasks.
///
/// The channel collaborator uses [`push_frame`](Self::push_frame) to hand over
/// received frames; producers of user messages use
/// [`submit_command`](Self::submit_command).
#[derive(Debug, Clone)]
pub struct EndpointHandle {
    config: Arc<LinkConfig>,
    frame_tx: mpsc::UnboundedSender<Vec<u8>>,
    command_tx: mpsc::UnboundedSender<Command>,
}

impl EndpointHandle {
    /// Id of the entity behind this handle.
    pub fn self_id(&self) -> PeerId {
        self.config.self_id
    }

    /// Queue raw frame bytes received from the channel.
    pub fn push_frame(&self, bytes: &[u8]) -> LinkResult<()> {
        self.frame_tx
            .send(bytes.to_vec())
            .map_err(|_| LinkError::Shutdown)
    }

    /// Queue a user message from `src` to `dst`.
    ///
    /// Returns an error without queueing anything if `src` is not this
    /// entity, `dst` is not a remote peer, or `message` contains a NUL byte.
    pub fn submit_command(
        &self,
        src: PeerId,
        dst: PeerId,
        message: impl Into<String>,
    ) -> LinkResult<()> {
        let message = message.into();
        self.config.check_command(src, dst, &message)?;

        self.command_tx
            .send(Command { src, dst, message })
            .map_err(|_| LinkError::Shutdown)
    }

    /// Queue a message from this entity to `dst`.
    pub fn send(&self, dst: PeerId, message: impl Into<String>) -> LinkResult<()> {
        self.submit_command(self.config.self_id, dst, message)
    }
}

/// One entity on the shared channel, driven by a background task.
///
/// Dropping the endpoint stops the worker; [`shutdown`](Self::shutdown) does
/// the same and waits for the final [`LinkStats`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use srlink::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> LinkResult<()> {
/// let config = LinkConfigBuilder::new()
///     .self_id(PeerId(0))
///     .peer_count(2)
///     .build()?;
///
/// let channel: Arc<dyn Channel> = Arc::new(|_frame: [u8; FRAME_SIZE]| {});
/// let endpoint = Endpoint::spawn(config, channel, ConsoleReport::new(PeerId(0)))?;
///
/// endpoint.handle().send(PeerId(1), "hello")?;
/// let stats = endpoint.shutdown().await?;
/// assert!(stats.frames_sent <= 1);
/// # Ok(())
/// # }
/// ```
pub struct Endpoint {
    handle: EndpointHandle,
    shutdown_tx: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<LinkStats>>,
}

impl Endpoint {
    /// Validate `config` and start the worker task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(
        config: LinkConfig,
        channel: Arc<dyn Channel>,
        upper: impl UpperLayer,
    ) -> LinkResult<Self> {
        let engine = ArqEngine::new(config.clone())?;

        let (frame_tx, frames) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown) = oneshot::channel();

        let worker = Worker {
            engine,
            channel,
            upper: Box::new(upper),
            frames,
            commands,
            shutdown,
        };

        Ok(Self {
            handle: EndpointHandle {
                config: Arc::new(config),
                frame_tx,
                command_tx,
            },
            shutdown_tx: Some(shutdown_tx),
            worker: Some(tokio::spawn(worker.run())),
        })
    }

    /// A new handle to this endpoint.
    pub fn handle(&self) -> EndpointHandle {
        self.handle.clone()
    }

    /// Id of this entity.
    pub fn self_id(&self) -> PeerId {
        self.handle.self_id()
    }

    /// Stop the worker and return its final counters.
    ///
    /// Frames still buffered or pending are abandoned.
    pub async fn shutdown(mut self) -> LinkResult<LinkStats> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match self.worker.take() {
            Some(worker) => worker.await.map_err(|_| LinkError::Shutdown),
            None => Err(LinkError::Shutdown),
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("self_id", &self.self_id())
            .field("running", &self.worker.is_some())
            .finish()
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        // Send shutdown signal if not already sent
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arq::LinkConfigBuilder;
    use crate::core::FRAME_SIZE;
    use crate::transport::Frame;
    use std::sync::Mutex;
    use std::time::Duration;

    type Wire = Arc<Mutex<Vec<[u8; FRAME_SIZE]>>>;

    fn recording_channel() -> (Arc<dyn Channel>, Wire) {
        let wire: Wire = Arc::default();
        let sink = Arc::clone(&wire);
        let channel: Arc<dyn Channel> =
            Arc::new(move |frame: [u8; FRAME_SIZE]| sink.lock().unwrap().push(frame));
        (channel, wire)
    }

    fn config(id: u8) -> LinkConfig {
        config_with_peers(id, 2)
    }

    fn config_with_peers(id: u8, peers: usize) -> LinkConfig {
        LinkConfigBuilder::new()
            .self_id(PeerId(id))
            .peer_count(peers)
            .rto(Duration::from_millis(100))
            .build()
            .unwrap()
    }

    fn sent_frames(wire: &Wire) -> Vec<Frame> {
        wire.lock()
            .unwrap()
            .iter()
            .map(|bytes| Frame::from_bytes(bytes).unwrap())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_is_transmitted() {
        let (channel, wire) = recording_channel();
        let endpoint = Endpoint::spawn(config(0), channel, |_: PeerId, _: String| {}).unwrap();

        endpoint.handle().send(PeerId(1), "ping").unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let frames = sent_frames(&wire);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload_text(), b"ping");
        assert_eq!(frames[0].dst, PeerId(1));

        let stats = endpoint.shutdown().await.unwrap();
        assert_eq!(stats.frames_sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unacked_frame_is_retransmitted_after_rto() {
        let (channel, wire) = recording_channel();
        let endpoint = Endpoint::spawn(config(0), channel, |_: PeerId, _: String| {}).unwrap();

        endpoint.handle().send(PeerId(1), "lost").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(wire.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let frames = sent_frames(&wire);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);

        // An ack stops further retransmissions.
        let ack = Frame::ack(PeerId(1), PeerId(0), frames[0].seq);
        endpoint.handle().push_frame(&ack.to_bytes()).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(wire.lock().unwrap().len(), 2);

        let stats = endpoint.shutdown().await.unwrap();
        assert_eq!(stats.retransmissions, 1);
        assert_eq!(stats.acks_received, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_peer_retransmits_at_its_own_deadline() {
        let (channel, wire) = recording_channel();
        let endpoint =
            Endpoint::spawn(config_with_peers(0, 3), channel, |_: PeerId, _: String| {}).unwrap();

        // Peer 1 armed at t0, peer 2 at t0 + 40ms.
        endpoint.handle().send(PeerId(1), "one").unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        endpoint.handle().send(PeerId(2), "two").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(wire.lock().unwrap().len(), 2);

        // t0 + 120ms: only peer 1 has expired.
        tokio::time::sleep(Duration::from_millis(60)).await;
        let frames = sent_frames(&wire);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].dst, PeerId(1));

        // t0 + 160ms: peer 2 follows at its own deadline.
        tokio::time::sleep(Duration::from_millis(40)).await;
        let frames = sent_frames(&wire);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[3].dst, PeerId(2));

        let stats = endpoint.shutdown().await.unwrap();
        assert_eq!(stats.frames_sent, 2);
        assert_eq!(stats.retransmissions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_worker_transmits_nothing() {
        let (channel, wire) = recording_channel();
        let endpoint = Endpoint::spawn(config(0), channel, |_: PeerId, _: String| {}).unwrap();

        // Several idle poll intervals pass without any traffic.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(wire.lock().unwrap().is_empty());

        endpoint.handle().send(PeerId(1), "wake").unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(wire.lock().unwrap().len(), 1);

        let stats = endpoint.shutdown().await.unwrap();
        assert_eq!(stats.retransmissions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_data_is_delivered_and_acked() {
        let (channel, wire) = recording_channel();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let endpoint = Endpoint::spawn(config(1), channel, move |from: PeerId, msg: String| {
            sink.lock().unwrap().push((from, msg))
        })
        .unwrap();

        let mut frame = crate::arq::segment(PeerId(0), PeerId(1), b"hi there")[0];
        frame.stamp();
        endpoint.handle().push_frame(&frame.to_bytes()).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(seen.lock().unwrap().as_slice(), &[(PeerId(0), "hi there".to_string())]);
        let frames = sent_frames(&wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_ack());
        assert_eq!(frames[0].dst, PeerId(0));

        endpoint.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_rejects_invalid_commands() {
        let (channel, _wire) = recording_channel();
        let endpoint = Endpoint::spawn(config(0), channel, |_: PeerId, _: String| {}).unwrap();
        let handle = endpoint.handle();

        assert!(matches!(handle.send(PeerId(0), "me"), Err(LinkError::SelfAddressed(_))));
        assert!(matches!(handle.send(PeerId(5), "x"), Err(LinkError::UnknownPeer(_))));
        assert!(matches!(
            handle.submit_command(PeerId(1), PeerId(0), "x"),
            Err(LinkError::ForeignSource { .. })
        ));

        endpoint.shutdown().await.unwrap();
        assert!(matches!(handle.send(PeerId(1), "late"), Err(LinkError::Shutdown)));
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_config() {
        let (channel, _wire) = recording_channel();
        let config = LinkConfig {
            peer_count: 0,
            ..LinkConfig::default()
        };
        assert!(matches!(
            Endpoint::spawn(config, channel, |_: PeerId, _: String| {}),
            Err(LinkError::Config(_))
        ));
    }
}
