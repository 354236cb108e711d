//! srlink - Core traits, types, and constants.
//!
//! This module provides the foundational types shared by every layer: peer
//! identifiers, protocol constants, error types, and the collaborator traits
//! through which the link talks to the channel and to the upper layer.

mod constants;
mod error;
mod peer;
mod traits;

pub use constants::*;
pub use error::*;
pub use peer::*;
pub use traits::*;
