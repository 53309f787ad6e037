//! Power-of-two quantization scales
//!
//! A tile is quantized with the largest power-of-two scale that keeps every
//! rounded value inside the signed representable range of the target bit
//! width. The scale is recomputed from the observed min/max of each tile, so
//! quantization error stays adaptively bounded without calibration passes.

/// Pick the base-2 exponent `e` such that `2^e` is the largest power-of-two
/// scale keeping `round(x * 2^e)` within
/// `[-(2^(b-1)) - 0.5, 2^(b-1) - 1 + 0.5]` for both tile extremes.
///
/// Computed as `floor(log2(min(|max_int / max_val|, |min_int / min_val|)))`.
/// When both extremes are exactly zero the tile is all zeros and the
/// exponent is 0 (scale 1), so downstream rescaling never divides by zero.
///
/// `bits` must be in `1..=32`; the quantizing tiers use 8 and 16.
#[inline]
pub fn choose_scale(bits: u32, max_val: f32, min_val: f32) -> i32 {
    debug_assert!((1..=32).contains(&bits), "unsupported bit width {bits}");
    if max_val == 0.0 && min_val == 0.0 {
        return 0;
    }

    let limit = (1u32 << (bits - 1)) as f32;
    let max_rep = (limit - 1.0) + 0.5;
    let min_rep = -limit - 0.5;
    // A zero extreme yields an infinite ratio and the other side wins the min.
    let range_best = (max_rep / max_val).abs().min((min_rep / min_val).abs());
    range_best.log2().floor() as i32
}

/// A quantization scale with its reciprocal precomputed for the hot path
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    /// Base-2 exponent of the scale
    pub exponent: i32,
    /// `2^exponent`
    pub scale: f32,
    /// `2^-exponent`
    pub inv: f32,
}

impl Scale {
    /// Identity scale (exponent 0)
    pub const IDENTITY: Scale = Scale {
        exponent: 0,
        scale: 1.0,
        inv: 1.0,
    };

    /// Scale for quantizing values in `[min_val, max_val]` to `bits`-wide
    /// signed representations
    #[inline]
    pub fn for_range(bits: u32, max_val: f32, min_val: f32) -> Self {
        let exponent = choose_scale(bits, max_val, min_val);
        Self {
            exponent,
            scale: (exponent as f32).exp2(),
            inv: (-exponent as f32).exp2(),
        }
    }
}
