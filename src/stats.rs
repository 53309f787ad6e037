//! Statistics accumulators for quantization monitoring
//!
//! Diagnostic outputs of a launch: per-worker squared-gradient-norm totals
//! and a per-dimension sum of gradient contributions shared by all workers.
//! The shared buffer is the one place in the kernel that needs atomic
//! discipline; everything else races freely. std has no atomic f32, so the
//! accumulate is a compare-and-swap loop over the `AtomicU32` bit pattern.

use std::sync::atomic::{AtomicU32, Ordering};

/// An f32 accumulator with atomic add, stored as `AtomicU32` bits
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Create with an initial value
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Read the current value
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Overwrite the current value
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Atomically add `value`; no concurrent update is lost
    #[inline]
    pub fn fetch_add(&self, value: f32) -> f32 {
        let prev = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f32::from_bits(bits) + value).to_bits())
            })
            .unwrap_or_else(|bits| bits); // closure never returns None
        f32::from_bits(prev)
    }
}

/// Output buffers of one launch, allocated once and reset by the caller
/// between launches.
#[derive(Debug)]
pub struct SgdStats {
    /// Squared-gradient-norm running total, one slot per worker
    pub sum_norms: Vec<f32>,
    /// Per-dimension sum of gradient contributions across all workers,
    /// length `k`
    pub sum_updated_val: Vec<AtomicF32>,
}

impl SgdStats {
    /// Zero-initialized buffers for `workers` workers and vector width `k`
    pub fn new(workers: usize, k: usize) -> Self {
        Self {
            sum_norms: vec![0.0; workers],
            sum_updated_val: (0..k).map(|_| AtomicF32::new(0.0)).collect(),
        }
    }

    /// Zero all accumulators (call between launches)
    pub fn reset(&mut self) {
        self.sum_norms.fill(0.0);
        for slot in &self.sum_updated_val {
            slot.store(0.0);
        }
    }

    /// Snapshot of the per-dimension accumulator as plain floats
    pub fn updated_val(&self) -> Vec<f32> {
        self.sum_updated_val.iter().map(AtomicF32::load).collect()
    }
}
