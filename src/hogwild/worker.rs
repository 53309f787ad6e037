//! Per-worker update loop
//!
//! One worker stands in for a 32-lane group: it owns one RNG state and
//! repeatedly samples an interaction, predicts its rating, forms the
//! gradients, and writes the updated factors back. The outer loop redraws a random start index for statistical
//! independence; the inner loop walks `update_vector_size` consecutive
//! interactions (wrapping modulo `nnz`) for memory locality. Factor writes
//! go straight through the shared grid with no synchronization.

use crate::data::{FactorGrid, Interaction};
use crate::kernel::{backward_scale, predict, tile_range, GradKernel, TileRange};
use crate::lanes::{self, LANE_WIDTH};
use crate::quant::Scale;
use crate::rng::WorkerRng;
use crate::stats::AtomicF32;

use super::SgdConfig;

const ZERO_RANGE: TileRange = TileRange { min: 0.0, max: 0.0 };

/// Run one worker to completion, returning its squared-gradient-norm total.
pub(super) fn run_worker(
    interactions: &[Interaction],
    p: &FactorGrid<'_>,
    q: &FactorGrid<'_>,
    rng: &mut WorkerRng,
    config: &SgdConfig,
    sum_updated_val: &[AtomicF32],
) -> f32 {
    let k = config.k;
    let nnz = interactions.len();

    // Worker-local tile buffers standing in for the per-group register file.
    let mut p_tile = vec![0.0f32; k];
    let mut q_tile = vec![0.0f32; k];
    let mut grad_p = vec![0.0f32; k];
    let mut grad_q = vec![0.0f32; k];

    let need_ranges = config.forward.is_reduced() || config.backward.is_reduced();
    let collect_stats = config.forward.is_reduced() && config.backward.is_reduced();

    let mut processed: u32 = 0;
    let mut norms_total = 0.0f32;

    for _ in 0..config.update_count_this_block {
        let start = rng.next_index(nnz);

        for i in 0..config.update_vector_size {
            let node = interactions[(start + i) % nnz];
            let base_p = node.user as usize * k;
            let base_q = node.item as usize * k;

            // Row bounds were validated at launch; reads may race with
            // concurrent writers, which the algorithm tolerates.
            unsafe {
                p.read_tile(base_p, &mut p_tile);
                q.read_tile(base_q, &mut q_tile);
            }

            let (p_range, q_range) = if need_ranges {
                (tile_range(&p_tile), tile_range(&q_tile))
            } else {
                (ZERO_RANGE, ZERO_RANGE)
            };

            let (p_scale, q_scale) = if config.forward.is_reduced() {
                (
                    Scale::for_range(config.forward.bits(), p_range.max, p_range.min),
                    Scale::for_range(config.forward.bits(), q_range.max, q_range.min),
                )
            } else {
                (Scale::IDENTITY, Scale::IDENTITY)
            };

            let pred = predict(config.forward, &p_tile, &q_tile, p_scale, q_scale);
            let residual = node.rating - pred;

            let back_scale = if config.backward.is_reduced() {
                backward_scale(
                    config.backward.bits(),
                    p_range,
                    q_range,
                    residual,
                    config.lambda,
                )
            } else {
                Scale::IDENTITY
            };
            let grad = GradKernel::new(
                config.backward,
                residual,
                config.lambda,
                back_scale,
                config.rounding,
            );

            for j in 0..k {
                grad_p[j] = grad.eval(q_tile[j], p_tile[j], rng);
                grad_q[j] = grad.eval(p_tile[j], q_tile[j], rng);
            }

            // In-place Hogwild write-back: plain stores, no locking, no CAS.
            unsafe {
                for j in 0..k {
                    p.write(base_p + j, p_tile[j] + config.learning_rate * grad_p[j]);
                    q.write(base_q + j, q_tile[j] + config.learning_rate * grad_q[j]);
                }
            }

            if collect_stats && processed >= config.first_sample_rating_idx {
                let mut partials = [0.0f32; LANE_WIDTH];
                for j in 0..k {
                    partials[j % LANE_WIDTH] += grad_p[j] * grad_p[j] + grad_q[j] * grad_q[j];
                }
                norms_total += lanes::reduce_sum(&mut partials);

                for j in 0..k {
                    sum_updated_val[j].fetch_add(grad_p[j] + grad_q[j]);
                }
            }

            processed += 1;
        }
    }

    norms_total
}
