//! Peer identifiers.

use std::fmt;

/// Identifier of a peer on the shared channel (one byte on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PeerId(pub u8);

impl PeerId {
    /// Get the raw byte value.
    pub fn as_byte(self) -> u8 {
        self.0
    }

    /// Index into per-peer tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for PeerId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl From<PeerId> for u8 {
    fn from(id: PeerId) -> u8 {
        id.0
    }
}
