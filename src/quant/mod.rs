//! Quantization: power-of-two scale selection and rounding modes

mod round;
mod scale;

pub use round::{round_to_grid, Rounding};
pub use scale::{choose_scale, Scale};
