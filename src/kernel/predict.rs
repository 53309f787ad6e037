//! Forward pass: reduced dot product of two factor tiles
//!
//! A tile is one factor row of width `k`, owned across the 32-lane group
//! with stride 32. All three tiers form one partial per lane and reduce
//! through the lane-group tree, the software form of a warp shuffle ladder.
//!
//! The prediction path always rounds to nearest; stochastic rounding is a
//! gradient-side option only.

use half::f16;

use crate::lanes::{self, LANE_WIDTH};
use crate::quant::Scale;

use super::Precision;

/// Observed min/max of a tile, reduced across the lane group
#[derive(Clone, Copy, Debug)]
pub struct TileRange {
    /// Smallest element of the tile
    pub min: f32,
    /// Largest element of the tile
    pub max: f32,
}

/// Min/max discovery over one tile, one partial extreme per lane then a
/// group reduction. Only runs when a reduced precision needs a scale.
pub fn tile_range(tile: &[f32]) -> TileRange {
    debug_assert_eq!(tile.len() % LANE_WIDTH, 0);
    let mut mins = [f32::INFINITY; LANE_WIDTH];
    let mut maxs = [f32::NEG_INFINITY; LANE_WIDTH];
    for (i, &v) in tile.iter().enumerate() {
        let lane = i % LANE_WIDTH;
        mins[lane] = mins[lane].min(v);
        maxs[lane] = maxs[lane].max(v);
    }
    TileRange {
        min: lanes::reduce_min(&mut mins),
        max: lanes::reduce_max(&mut maxs),
    }
}

/// Predicted rating: dot product of two tiles at the selected precision.
///
/// `a_scale` / `b_scale` are the per-tile quantization scales; they are
/// ignored by the full-precision tier.
#[inline]
pub fn predict(precision: Precision, a: &[f32], b: &[f32], a_scale: Scale, b_scale: Scale) -> f32 {
    match precision {
        Precision::Single => dot_f32(a, b),
        Precision::Half => dot_f16(a, b, a_scale, b_scale),
        Precision::Int8 => dot_i8(a, b, a_scale, b_scale),
    }
}

/// Exact f32 dot product with lane-group reduction
fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut partials = [0.0f32; LANE_WIDTH];
    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        partials[i % LANE_WIDTH] += x * y;
    }
    lanes::reduce_sum(&mut partials)
}

/// Half tier: each element snapped to its scale grid and narrowed to f16,
/// products formed in f16 and widened to f32 for summation
fn dot_f16(a: &[f32], b: &[f32], a_scale: Scale, b_scale: Scale) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut partials = [0.0f32; LANE_WIDTH];
    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        let qx = f16::from_f32((x * a_scale.scale).round() * a_scale.inv);
        let qy = f16::from_f32((y * b_scale.scale).round() * b_scale.inv);
        partials[i % LANE_WIDTH] += (qx * qy).to_f32();
    }
    lanes::reduce_sum(&mut partials)
}

/// 4-wide i8 multiply-accumulate into i32 (the dp4a instruction analog)
#[inline]
fn dp4a(a: [i8; 4], b: [i8; 4], acc: i32) -> i32 {
    acc + a[0] as i32 * b[0] as i32
        + a[1] as i32 * b[1] as i32
        + a[2] as i32 * b[2] as i32
        + a[3] as i32 * b[3] as i32
}

/// Narrow a value to i8 at the scale grid. The float-to-int cast saturates,
/// covering the half-step slack at the range edges.
#[inline]
pub(super) fn quantize_i8(v: f32, scale: Scale) -> i8 {
    (v * scale.scale).round() as i8
}

/// Int8 tier: both tiles quantized with their own scales, integer dot at
/// 4-element granularity, i32 partials reduced then rescaled by
/// `1 / (scale_a * scale_b)`
fn dot_i8(a: &[f32], b: &[f32], a_scale: Scale, b_scale: Scale) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len() % LANE_WIDTH, 0);
    let elems_per_lane = a.len() / LANE_WIDTH;

    let mut partials = [0i32; LANE_WIDTH];
    for (lane, partial) in partials.iter_mut().enumerate() {
        let mut acc = 0i32;
        let mut e = 0;
        while e < elems_per_lane {
            let mut qa = [0i8; 4];
            let mut qb = [0i8; 4];
            for j in 0..4.min(elems_per_lane - e) {
                let i = (e + j) * LANE_WIDTH + lane;
                qa[j] = quantize_i8(a[i], a_scale);
                qb[j] = quantize_i8(b[i], b_scale);
            }
            acc = dp4a(qa, qb, acc);
            e += 4;
        }
        *partial = acc;
    }

    lanes::reduce_sum(&mut partials) as f32 * (a_scale.inv * b_scale.inv)
}
