//! Error types for srlink.

use thiserror::Error;

use super::peer::PeerId;
use crate::transport::FrameError;

/// Errors raised while validating a [`LinkConfig`](crate::arq::LinkConfig).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The peer table is empty.
    #[error("peer table is empty")]
    NoPeers,

    /// More peers than one-byte ids can address.
    #[error("peer table too large: {0} (max 256)")]
    TooManyPeers(usize),

    /// The entity's own id is not part of the peer table.
    #[error("self id {self_id} outside peer table of {peer_count}")]
    SelfIdOutOfRange {
        /// Configured self id.
        self_id: PeerId,
        /// Configured peer count.
        peer_count: usize,
    },

    /// A timer duration of zero would spin the worker.
    #[error("{0} must be non-zero")]
    ZeroDuration(&'static str),

    /// A probability outside `[0, 1]`.
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidProbability {
        /// Setting name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// Top-level link errors.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Frame codec error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Destination is not in the peer table.
    #[error("unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// A message was addressed to the sending entity itself.
    #[error("message addressed to self ({0})")]
    SelfAddressed(PeerId),

    /// A command claimed a source other than the owning entity.
    #[error("command source {actual} does not match entity {expected}")]
    ForeignSource {
        /// The entity's id.
        expected: PeerId,
        /// Source id carried by the command.
        actual: PeerId,
    },

    /// Message text contains a NUL byte, which terminates messages on the wire.
    #[error("message contains an interior NUL byte at offset {0}")]
    InteriorNul(usize),

    /// The endpoint worker has stopped.
    #[error("endpoint shut down")]
    Shutdown,
}

impl LinkError {
    /// Check if this error describes inbound protocol noise that is dropped
    /// without any response.
    pub fn is_silent_drop(&self) -> bool {
        matches!(self, LinkError::Frame(_))
    }

    /// Check if this error means the endpoint can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::Shutdown | LinkError::Config(_))
    }
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
