//! Rounding modes for quantization
//!
//! Round-to-nearest systematically biases quantization error toward zero;
//! stochastic rounding adds a uniform offset in `[-0.5, 0.5)` before
//! rounding so the error is zero-mean in expectation. The stochastic mode is
//! used on the gradient quantization path only; predictions always round to
//! nearest.

use crate::rng::WorkerRng;

/// How scaled values are rounded before narrowing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Round to the nearest representable value
    #[default]
    Nearest,
    /// Add a uniform `[-0.5, 0.5)` offset from the worker's RNG, then round
    /// to nearest (unbiased in expectation)
    Stochastic,
}

/// Round an already-scaled value to the integer grid under the given mode
#[inline]
pub fn round_to_grid(scaled: f32, mode: Rounding, rng: &mut WorkerRng) -> f32 {
    match mode {
        Rounding::Nearest => scaled.round(),
        Rounding::Stochastic => (scaled + rng.round_offset()).round(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_ignores_rng() {
        let mut rng = WorkerRng::from_seed(1);
        assert_eq!(round_to_grid(2.4, Rounding::Nearest, &mut rng), 2.0);
        assert_eq!(round_to_grid(-2.6, Rounding::Nearest, &mut rng), -3.0);
    }

    #[test]
    fn test_stochastic_lands_on_neighbors() {
        let mut rng = WorkerRng::from_seed(2);
        for _ in 0..200 {
            let r = round_to_grid(2.25, Rounding::Stochastic, &mut rng);
            assert!(r == 2.0 || r == 3.0);
        }
    }

    #[test]
    fn test_stochastic_unbiased() {
        // Mean of many stochastic rounds converges to the unrounded value.
        let mut rng = WorkerRng::from_seed(3);
        let target = 5.3f32;
        let n = 20_000;
        let sum: f64 = (0..n)
            .map(|_| round_to_grid(target, Rounding::Stochastic, &mut rng) as f64)
            .sum();
        let mean = sum / n as f64;
        assert!((mean - target as f64).abs() < 0.02, "mean = {mean}");
    }
}
