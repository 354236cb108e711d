//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use srlink::prelude::*;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for tests.
///
/// Uses `try_init` so every test can call it.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Link configuration for entity `id` among `peers` stations.
pub fn link_config(id: u8, peers: usize) -> LinkConfig {
    LinkConfigBuilder::new()
        .self_id(PeerId(id))
        .peer_count(peers)
        .rto(Duration::from_millis(100))
        .build()
        .expect("valid test config")
}

/// Upper layer that records every delivered message.
#[derive(Clone, Default)]
pub struct Collector {
    messages: Arc<Mutex<Vec<(PeerId, String)>>>,
}

impl Collector {
    /// Everything delivered so far, in delivery order.
    pub fn messages(&self) -> Vec<(PeerId, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// Messages that came from `peer`, in delivery order.
    pub fn from_peer(&self, peer: PeerId) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(from, _)| *from == peer)
            .map(|(_, msg)| msg)
            .collect()
    }

    /// Number of messages delivered so far.
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl UpperLayer for Collector {
    fn deliver(&mut self, from: PeerId, message: String) {
        self.messages.lock().unwrap().push((from, message));
    }
}

/// Advance (paused) time in small steps until `done` holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) -> bool {
    let step = Duration::from_millis(20);
    let mut waited = Duration::ZERO;
    while !done() {
        if waited >= limit {
            return false;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
    true
}

/// A readable message of exactly `len` bytes, tagged with `tag`.
pub fn message_of_len(tag: usize, len: usize) -> String {
    let prefix = format!("#{tag}:");
    let filler = (0..len.saturating_sub(prefix.len())).map(|i| (b'a' + (i % 26) as u8) as char);
    prefix.chars().chain(filler).take(len).collect()
}
