//! Backward pass: per-element gradient contributions
//!
//! The gradient of one element is `residual * other - lambda * value`. At
//! reduced precision this is expressed as a degenerate 2-element dot
//! product: the interaction-constant pair `(residual, -lambda)` against the
//! per-element pair `(other, value)`, sharing one backward scale drawn from
//! the joint range of both tiles, the residual, and `-lambda` (gradients and
//! factor values have different dynamic range than either tile alone).
//!
//! Stochastic rounding, when enabled, applies to the per-element pair; the
//! interaction-constant pair always rounds to nearest.

use half::f16;

use crate::quant::{round_to_grid, Rounding, Scale};
use crate::rng::WorkerRng;

use super::predict::{quantize_i8, TileRange};
use super::Precision;

/// Backward quantization scale from the joint range of the forward tiles,
/// the residual, and `-lambda`
#[inline]
pub fn backward_scale(
    bits: u32,
    p_range: TileRange,
    q_range: TileRange,
    residual: f32,
    lambda: f32,
) -> Scale {
    let min = p_range
        .min
        .min(q_range.min)
        .min((-lambda).min(residual));
    let max = p_range
        .max
        .max(q_range.max)
        .max((-lambda).max(residual));
    Scale::for_range(bits, max, min)
}

/// Gradient evaluator for one interaction, precision-dispatched once at
/// construction so the per-element path is branch-free over raw widths.
#[derive(Clone, Copy, Debug)]
pub enum GradKernel {
    /// Exact f32 expression
    Single {
        /// `rating - prediction`
        residual: f32,
        /// Regularization coefficient
        lambda: f32,
    },
    /// Half-precision multiply-accumulate of the two pairs
    Half {
        /// Quantized `(residual, -lambda)` at the backward scale
        pair: [f16; 2],
        /// Shared backward scale
        scale: Scale,
        /// Rounding mode for the per-element pair
        rounding: Rounding,
    },
    /// Degenerate 2-element i8 dot, rescaled by `1 / scale^2`
    Int8 {
        /// Quantized `(residual, -lambda)` at the backward scale
        pair: [i8; 2],
        /// Shared backward scale
        scale: Scale,
        /// Precomputed `scale.inv * scale.inv`
        inv_sq: f32,
        /// Rounding mode for the per-element pair
        rounding: Rounding,
    },
}

impl GradKernel {
    /// Build the evaluator for one interaction. `scale` is the backward
    /// scale; it is ignored at full precision.
    pub fn new(
        precision: Precision,
        residual: f32,
        lambda: f32,
        scale: Scale,
        rounding: Rounding,
    ) -> Self {
        match precision {
            Precision::Single => Self::Single { residual, lambda },
            Precision::Half => {
                let pair = [
                    f16::from_f32((residual * scale.scale).round() * scale.inv),
                    f16::from_f32((-lambda * scale.scale).round() * scale.inv),
                ];
                Self::Half {
                    pair,
                    scale,
                    rounding,
                }
            }
            Precision::Int8 => {
                let pair = [quantize_i8(residual, scale), quantize_i8(-lambda, scale)];
                Self::Int8 {
                    pair,
                    scale,
                    inv_sq: scale.inv * scale.inv,
                    rounding,
                }
            }
        }
    }

    /// Gradient contribution `residual * other - lambda * value` at the
    /// configured precision.
    ///
    /// For a P element, `other` is the paired Q element and `value` the P
    /// element itself (and symmetrically for Q).
    #[inline]
    pub fn eval(&self, other: f32, value: f32, rng: &mut WorkerRng) -> f32 {
        match *self {
            Self::Single { residual, lambda } => residual * other - lambda * value,
            Self::Half {
                pair,
                scale,
                rounding,
            } => {
                let qo = f16::from_f32(round_to_grid(other * scale.scale, rounding, rng) * scale.inv);
                let qv = f16::from_f32(round_to_grid(value * scale.scale, rounding, rng) * scale.inv);
                (pair[0] * qo).to_f32() + (pair[1] * qv).to_f32()
            }
            Self::Int8 {
                pair,
                scale,
                inv_sq,
                rounding,
            } => {
                let qo = round_to_grid(other * scale.scale, rounding, rng) as i8;
                let qv = round_to_grid(value * scale.scale, rounding, rng) as i8;
                let dot = pair[0] as i32 * qo as i32 + pair[1] as i32 * qv as i32;
                dot as f32 * inv_sq
            }
        }
    }
}
