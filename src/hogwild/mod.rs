//! Hogwild update scheduler: launch configuration and worker fan-out
//!
//! A launch maps one worker per RNG state onto the interaction stream. No
//! cross-worker synchronization happens during the launch body; workers
//! race on factor rows by design and only the statistics buffer uses
//! atomics. The caller may read the mutated factor arrays and statistics
//! only after [`sgd_launch`] returns (the kernel-completion barrier).

mod worker;

use crate::data::{FactorGrid, Interaction};
use crate::error::{Error, Result};
use crate::kernel::Precision;
use crate::lanes::LANE_WIDTH;
use crate::quant::Rounding;
use crate::rng::WorkerRng;
use crate::stats::SgdStats;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Launch configuration for one SGD kernel invocation.
///
/// RNG state and factor matrices persist across launches; reconfigure
/// freely between them (e.g. lowering precision as training stabilizes).
#[derive(Clone, Copy, Debug)]
pub struct SgdConfig {
    /// Factor vector width; must be a positive multiple of 32
    pub k: usize,
    /// SGD step size
    pub learning_rate: f32,
    /// L2 regularization coefficient
    pub lambda: f32,
    /// Outer random restarts per worker per launch
    pub update_count_this_block: usize,
    /// Consecutive interactions processed per restart (wrapping modulo nnz)
    pub update_vector_size: usize,
    /// Forward (prediction) precision
    pub forward: Precision,
    /// Backward (gradient) precision
    pub backward: Precision,
    /// Rounding mode for gradient quantization; the prediction path always
    /// rounds to nearest
    pub rounding: Rounding,
    /// Number of updates to skip per worker before statistics collection
    pub first_sample_rating_idx: u32,
}

impl SgdConfig {
    /// Full-precision defaults for vector width `k`
    pub fn new(k: usize) -> Self {
        Self {
            k,
            learning_rate: 0.01,
            lambda: 0.05,
            update_count_this_block: 1,
            update_vector_size: 32,
            forward: Precision::Single,
            backward: Precision::Single,
            rounding: Rounding::Nearest,
            first_sample_rating_idx: 0,
        }
    }
}

/// Run one Hogwild SGD launch over the interaction stream.
///
/// Every worker (one per entry of `rngs`) performs
/// `update_count_this_block * update_vector_size` in-place updates of the
/// shared factor matrices `p` (`num_users * k`) and `q` (`num_items * k`).
/// Concurrent writers to the same row may race; the resulting bounded error
/// is the accepted Hogwild trade-off.
///
/// `stats` must be sized for `rngs.len()` workers and width `k`, and zeroed
/// by the caller between launches ([`SgdStats::reset`]). `sum_norms[w]` is
/// overwritten with worker `w`'s total; `sum_updated_val` is accumulated
/// atomically across workers.
///
/// Configuration and row indices are validated up front; a failed launch
/// returns before touching any factor state, and a subsequent launch may be
/// retried independently (updates are idempotent-in-place writes, not
/// transactional).
pub fn sgd_launch(
    interactions: &[Interaction],
    p: &mut [f32],
    q: &mut [f32],
    rngs: &mut [WorkerRng],
    config: &SgdConfig,
    stats: &mut SgdStats,
) -> Result<()> {
    validate(interactions, p, q, rngs, config, stats)?;

    let p_grid = FactorGrid::new(p);
    let q_grid = FactorGrid::new(q);
    let sum_norms = &mut stats.sum_norms;
    let sum_updated_val = &stats.sum_updated_val[..];

    #[cfg(feature = "rayon")]
    rngs.par_iter_mut()
        .zip(sum_norms.par_iter_mut())
        .for_each(|(rng, norm_slot)| {
            *norm_slot = worker::run_worker(
                interactions,
                &p_grid,
                &q_grid,
                rng,
                config,
                sum_updated_val,
            );
        });

    #[cfg(not(feature = "rayon"))]
    for (rng, norm_slot) in rngs.iter_mut().zip(sum_norms.iter_mut()) {
        *norm_slot = worker::run_worker(
            interactions,
            &p_grid,
            &q_grid,
            rng,
            config,
            sum_updated_val,
        );
    }

    Ok(())
}

fn validate(
    interactions: &[Interaction],
    p: &[f32],
    q: &[f32],
    rngs: &[WorkerRng],
    config: &SgdConfig,
    stats: &SgdStats,
) -> Result<()> {
    let k = config.k;
    if k == 0 || k % LANE_WIDTH != 0 {
        return Err(Error::invalid_argument(
            "k",
            format!("vector width {k} must be a positive multiple of {LANE_WIDTH}"),
        ));
    }
    if interactions.is_empty() {
        return Err(Error::invalid_argument(
            "interactions",
            "at least one interaction is required",
        ));
    }
    if p.is_empty() || p.len() % k != 0 {
        return Err(Error::factor_shape("p", p.len(), k));
    }
    if q.is_empty() || q.len() % k != 0 {
        return Err(Error::factor_shape("q", q.len(), k));
    }
    if rngs.is_empty() {
        return Err(Error::invalid_argument(
            "rngs",
            "at least one worker RNG state is required",
        ));
    }
    if rngs.len() != stats.sum_norms.len() {
        return Err(Error::WorkerMismatch {
            rngs: rngs.len(),
            norm_slots: stats.sum_norms.len(),
        });
    }
    if stats.sum_updated_val.len() != k {
        return Err(Error::invalid_argument(
            "stats",
            format!(
                "sum_updated_val has {} slots, expected k = {k}",
                stats.sum_updated_val.len()
            ),
        ));
    }

    // One pass over the stream so the hot loop stays branch-free.
    let num_users = p.len() / k;
    let num_items = q.len() / k;
    for (index, node) in interactions.iter().enumerate() {
        if node.user as usize >= num_users {
            return Err(Error::RowOutOfBounds {
                index,
                side: "user",
                row: node.user as usize,
                rows: num_users,
            });
        }
        if node.item as usize >= num_items {
            return Err(Error::RowOutOfBounds {
                index,
                side: "item",
                row: node.item as usize,
                rows: num_items,
            });
        }
    }

    Ok(())
}
