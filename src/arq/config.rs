//! Per-entity link configuration.

use std::time::Duration;

use crate::core::{
    ConfigError, DEFAULT_IDLE_POLL, DEFAULT_RTO, LinkError, LinkResult, MAX_PEERS, PeerId,
};

/// Link configuration for one entity.
///
/// Replaces process-wide peer tables: each entity is told its own id and how
/// many peers share the channel, and sizes its windows from that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// This entity's peer id.
    pub self_id: PeerId,

    /// Number of peer ids on the channel (ids `0..peer_count`).
    pub peer_count: usize,

    /// Retransmission timeout for each buffered frame.
    pub rto: Duration,

    /// Wait bound used when no retransmission timer is armed.
    pub idle_poll: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            self_id: PeerId(0),
            peer_count: 2,
            rto: DEFAULT_RTO,
            idle_poll: DEFAULT_IDLE_POLL,
        }
    }
}

impl LinkConfig {
    /// Check the configuration for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peer_count == 0 {
            return Err(ConfigError::NoPeers);
        }
        if self.peer_count > MAX_PEERS {
            return Err(ConfigError::TooManyPeers(self.peer_count));
        }
        if self.self_id.index() >= self.peer_count {
            return Err(ConfigError::SelfIdOutOfRange {
                self_id: self.self_id,
                peer_count: self.peer_count,
            });
        }
        if self.rto.is_zero() {
            return Err(ConfigError::ZeroDuration("rto"));
        }
        if self.idle_poll.is_zero() {
            return Err(ConfigError::ZeroDuration("idle_poll"));
        }
        Ok(())
    }

    /// Check if `peer` is a remote peer this entity can exchange frames with.
    pub fn is_remote_peer(&self, peer: PeerId) -> bool {
        peer.index() < self.peer_count && peer != self.self_id
    }

    /// Check a user command before it is segmented.
    ///
    /// The source must be this entity, the destination a remote peer, and
    /// the text free of NUL bytes.
    pub fn check_command(&self, src: PeerId, dst: PeerId, message: &str) -> LinkResult<()> {
        if src != self.self_id {
            return Err(LinkError::ForeignSource {
                expected: self.self_id,
                actual: src,
            });
        }
        if dst == self.self_id {
            return Err(LinkError::SelfAddressed(dst));
        }
        if dst.index() >= self.peer_count {
            return Err(LinkError::UnknownPeer(dst));
        }
        if let Some(offset) = message.bytes().position(|b| b == 0) {
            return Err(LinkError::InteriorNul(offset));
        }
        Ok(())
    }
}

/// Builder for creating a [`LinkConfig`].
#[derive(Debug)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: LinkConfig::default(),
        }
    }

    /// Set this entity's id.
    pub fn self_id(mut self, id: PeerId) -> Self {
        self.config.self_id = id;
        self
    }

    /// Set the number of peers on the channel.
    pub fn peer_count(mut self, count: usize) -> Self {
        self.config.peer_count = count;
        self
    }

    /// Set the retransmission timeout.
    pub fn rto(mut self, rto: Duration) -> Self {
        self.config.rto = rto;
        self
    }

    /// Set the idle wait bound.
    pub fn idle_poll(mut self, interval: Duration) -> Self {
        self.config.idle_poll = interval;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<LinkConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for LinkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
