//! Random number generation for light-path sampling.
//!
//! Every worker owns its own [`Sampler`], seeded once at spawn time, so the hot
//! loop never touches shared generator state. Seeds come from a [`SeedSequence`]
//! on the coordinator thread; a fixed render seed therefore fixes every worker's
//! sequence.

use rand::{rng, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Per-worker uniform variate generator backed by ChaCha20.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: ChaCha20Rng,
}

impl Sampler {
    /// Create a sampler whose sequence is fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Generate a random f32 in [0.0, 1.0)
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random()
    }
}

/// Process-wide source of independent worker seeds.
#[derive(Debug)]
pub struct SeedSequence {
    rng: ChaCha20Rng,
}

impl SeedSequence {
    /// Seeds derived from `seed`, or from OS entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_rng(&mut rng()),
        };
        Self { rng }
    }

    /// Draw the seed for the next worker.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }
}
