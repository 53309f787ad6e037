//! Precision-parameterized compute kernels
//!
//! The forward (prediction) and backward (gradient) passes each run at one
//! of three precisions, selected independently per launch. Dispatch happens
//! once per tile over the closed [`Precision`] set, not per element.

mod gradient;
mod predict;

pub use gradient::{backward_scale, GradKernel};
pub use predict::{predict, tile_range, TileRange};

/// Arithmetic precision of a kernel pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precision {
    /// 8-bit signed integer with per-tile power-of-two scales
    Int8,
    /// 16-bit half-precision with per-tile power-of-two scales
    Half,
    /// Full 32-bit float, no quantization
    Single,
}

impl Precision {
    /// Select a precision from a requested bit width.
    ///
    /// Only 8 and 32 are special-cased; any other width selects the 16-bit
    /// tier. Callers that must reject unknown widths should check before
    /// converting.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            8 => Self::Int8,
            32 => Self::Single,
            _ => Self::Half,
        }
    }

    /// Bit width of this precision
    pub const fn bits(self) -> u32 {
        match self {
            Self::Int8 => 8,
            Self::Half => 16,
            Self::Single => 32,
        }
    }

    /// Whether this tier quantizes (anything below full precision)
    pub const fn is_reduced(self) -> bool {
        !matches!(self, Self::Single)
    }
}
