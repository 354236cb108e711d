//! Collaborator traits for srlink.
//!
//! The link never owns the physical channel or the application. It hands
//! encoded frames to a [`Channel`] and reassembled messages to an
//! [`UpperLayer`].

use super::constants::FRAME_SIZE;
use super::peer::PeerId;

/// The unreliable channel that moves encoded frames between peers.
///
/// Ownership of the frame buffer transfers to the channel. Implementations
/// may drop, corrupt, or reorder frames; the link recovers through
/// retransmission.
///
/// Any `Fn([u8; FRAME_SIZE])` closure is a channel:
///
/// ```
/// use srlink::core::{Channel, FRAME_SIZE};
///
/// let sink = |frame: [u8; FRAME_SIZE]| {
///     let _ = frame;
/// };
/// sink.transmit([0u8; FRAME_SIZE]);
/// ```
pub trait Channel: Send + Sync + 'static {
    /// Hand one encoded frame to the channel.
    fn transmit(&self, frame: [u8; FRAME_SIZE]);
}

impl<F> Channel for F
where
    F: Fn([u8; FRAME_SIZE]) + Send + Sync + 'static,
{
    fn transmit(&self, frame: [u8; FRAME_SIZE]) {
        self(frame)
    }
}

/// Receives complete messages once reassembly finishes.
pub trait UpperLayer: Send + 'static {
    /// Deliver one reconstructed message that originated at `from`.
    fn deliver(&mut self, from: PeerId, message: String);
}

impl<F> UpperLayer for F
where
    F: FnMut(PeerId, String) + Send + 'static,
{
    fn deliver(&mut self, from: PeerId, message: String) {
        self(from, message)
    }
}

/// Prints delivered messages in the reference console format
/// `<RECV-{id}>:[{message}]`, where `id` is the receiving entity.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReport {
    receiver: PeerId,
}

impl ConsoleReport {
    /// Create a reporter for the entity `receiver`.
    pub fn new(receiver: PeerId) -> Self {
        Self { receiver }
    }

    /// Format a message as it would be printed.
    pub fn format(&self, message: &str) -> String {
        format!("<RECV-{}>:[{}]", self.receiver, message)
    }
}

impl UpperLayer for ConsoleReport {
    fn deliver(&mut self, _from: PeerId, message: String) {
        println!("{}", self.format(&message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_console_format() {
        let report = ConsoleReport::new(PeerId(3));
        assert_eq!(report.format("hello world"), "<RECV-3>:[hello world]");
    }

    #[test]
    fn test_closure_upper_layer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut upper = move |from: PeerId, msg: String| sink.lock().unwrap().push((from, msg));

        upper.deliver(PeerId(2), "hi".to_string());

        assert_eq!(seen.lock().unwrap().as_slice(), &[(PeerId(2), "hi".to_string())]);
    }

    #[test]
    fn test_closure_channel() {
        let count = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&count);
        let channel = move |_frame: [u8; FRAME_SIZE]| *counter.lock().unwrap() += 1;

        channel.transmit([0u8; FRAME_SIZE]);
        channel.transmit([1u8; FRAME_SIZE]);

        assert_eq!(*count.lock().unwrap(), 2);
    }
}
