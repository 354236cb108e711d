//! srlink - Simulated channel.
//!
//! A shared broadcast medium that loses and corrupts frames at configurable,
//! seeded rates. Endpoints attached to it see the same kind of unreliable
//! channel the link is built to survive, which makes it the natural harness
//! for end-to-end tests and demos.

mod medium;

pub use medium::*;
