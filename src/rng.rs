//! Per-worker pseudo-random generators
//!
//! Each worker owns one generator, seeded once and mutated in place for the
//! whole training run: it draws the random restart index of every outer
//! iteration and, when stochastic rounding is enabled, the sub-unit rounding
//! offsets. State is never shared across workers, so no locking is needed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Independent per-worker generator state.
///
/// Persists across launches; seed once with [`WorkerRng::seed_workers`] and
/// keep the same vector for the lifetime of the training run.
#[derive(Debug, Clone)]
pub struct WorkerRng(SmallRng);

impl WorkerRng {
    /// Create a single generator from a seed
    pub fn from_seed(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Derive `n` independent worker streams from one master seed
    pub fn seed_workers(seed: u64, n: usize) -> Vec<Self> {
        (0..n as u64)
            .map(|w| Self::from_seed(seed ^ w.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
            .collect()
    }

    /// Uniform draw in `[0, nnz)` for a random restart index
    #[inline]
    pub fn next_index(&mut self, nnz: usize) -> usize {
        self.0.random_range(0..nnz)
    }

    /// Uniform offset in `[-0.5, 0.5)` for stochastic rounding
    #[inline]
    pub fn round_offset(&mut self) -> f32 {
        self.0.random::<f32>() - 0.5
    }
}
