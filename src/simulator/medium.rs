//! Lossy broadcast medium.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arq::LinkConfig;
use crate::core::{Channel, ConfigError, FRAME_SIZE, LinkResult, PeerId, UpperLayer};
use crate::endpoint::{Endpoint, EndpointHandle};

/// Impairment settings for a [`SharedMedium`].
#[derive(Debug, Clone, PartialEq)]
pub struct MediumConfig {
    /// Probability that a copy of a frame never reaches a station.
    pub loss_rate: f64,
    /// Probability that a delivered copy has one bit flipped.
    pub corrupt_rate: f64,
    /// Seed for the impairment generator.
    pub seed: u64,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0,
        }
    }
}

impl MediumConfig {
    /// Set the loss probability.
    pub fn loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = rate;
        self
    }

    /// Set the corruption probability.
    pub fn corrupt_rate(mut self, rate: f64) -> Self {
        self.corrupt_rate = rate;
        self
    }

    /// Set the generator seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that both rates are probabilities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("loss_rate", self.loss_rate), ("corrupt_rate", self.corrupt_rate)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        Ok(())
    }
}

/// Counters for what the medium did to the traffic it carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediumStats {
    /// Frames handed to the medium by stations.
    pub transmitted: u64,
    /// Copies handed to receiving stations.
    pub delivered: u64,
    /// Copies lost.
    pub dropped: u64,
    /// Delivered copies with a flipped bit.
    pub corrupted: u64,
}

struct Inner {
    config: MediumConfig,
    stations: Vec<EndpointHandle>,
    rng: StdRng,
    stats: MediumStats,
}

/// A broadcast channel shared by every attached endpoint.
///
/// Each transmitted frame is offered to every station except its sender.
/// Every copy is independently lost or corrupted according to
/// [`MediumConfig`]; stations discard frames not addressed to them.
#[derive(Clone)]
pub struct SharedMedium {
    inner: Arc<Mutex<Inner>>,
}

impl SharedMedium {
    /// Create an empty medium.
    pub fn new(config: MediumConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                config,
                stations: Vec::new(),
                rng,
                stats: MediumStats::default(),
            })),
        })
    }

    /// Create a medium that neither loses nor corrupts frames.
    pub fn lossless() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                config: MediumConfig::default(),
                stations: Vec::new(),
                rng: StdRng::seed_from_u64(0),
                stats: MediumStats::default(),
            })),
        }
    }

    /// The [`Channel`] a station with id `origin` transmits through.
    pub fn port(&self, origin: PeerId) -> Arc<dyn Channel> {
        Arc::new(MediumPort {
            medium: self.clone(),
            origin,
        })
    }

    /// Start receiving frames on behalf of `handle`.
    pub fn attach(&self, handle: EndpointHandle) {
        let mut inner = self.lock();
        inner.stations.retain(|h| h.self_id() != handle.self_id());
        inner.stations.push(handle);
    }

    /// Stop delivering frames to station `peer`.
    pub fn detach(&self, peer: PeerId) {
        self.lock().stations.retain(|h| h.self_id() != peer);
    }

    /// Spawn an endpoint wired to this medium in both directions.
    pub fn spawn_endpoint(
        &self,
        config: LinkConfig,
        upper: impl UpperLayer,
    ) -> LinkResult<Endpoint> {
        let endpoint = Endpoint::spawn(config.clone(), self.port(config.self_id), upper)?;
        self.attach(endpoint.handle());
        Ok(endpoint)
    }

    /// Traffic counters so far.
    pub fn stats(&self) -> MediumStats {
        self.lock().stats
    }

    fn broadcast(&self, origin: PeerId, frame: [u8; FRAME_SIZE]) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.stats.transmitted += 1;

        for station in inner.stations.iter().filter(|h| h.self_id() != origin) {
            if inner.rng.gen_bool(inner.config.loss_rate) {
                inner.stats.dropped += 1;
                continue;
            }

            let mut copy = frame;
            if inner.rng.gen_bool(inner.config.corrupt_rate) {
                let bit = inner.rng.gen_range(0..FRAME_SIZE * 8);
                copy[bit / 8] ^= 1 << (bit % 8);
                inner.stats.corrupted += 1;
            }

            match station.push_frame(&copy) {
                Ok(()) => inner.stats.delivered += 1,
                Err(_) => tracing::trace!(station = %station.self_id(), "station gone"),
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SharedMedium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SharedMedium")
            .field("config", &inner.config)
            .field("stations", &inner.stations.len())
            .field("stats", &inner.stats)
            .finish()
    }
}

/// One station's transmit side of a [`SharedMedium`].
struct MediumPort {
    medium: SharedMedium,
    origin: PeerId,
}

impl Channel for MediumPort {
    fn transmit(&self, frame: [u8; FRAME_SIZE]) {
        self.medium.broadcast(self.origin, frame);
    }
}
