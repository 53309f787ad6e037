//! # factr
//!
//! **Lock-free parallel SGD matrix factorization with reduced-precision kernels.**
//!
//! factr implements rank-k latent-factor matrix factorization trained by
//! Hogwild-style stochastic gradient descent: many workers update the shared
//! factor matrices concurrently with no synchronization, tolerating the rare
//! colliding write in exchange for throughput.
//!
//! ## Why factr?
//!
//! - **Lock-free**: workers never block on each other; factor rows are
//!   written in place through a shared grid, Hogwild-style
//! - **Reduced precision**: forward and backward passes independently run at
//!   32-bit, 16-bit half, or 8-bit integer precision, with per-tile
//!   power-of-two scales computed from the observed value range
//! - **Stochastic rounding**: optional unbiased rounding on the gradient
//!   quantization path
//! - **Pure Rust**: no GPU toolchain, no FFI; the warp-style lane-group
//!   reduction is an explicit software tree
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use factr::prelude::*;
//!
//! let interactions = vec![Interaction::new(0, 0, 5.0)];
//! let mut p = vec![0.1f32; num_users * 64];
//! let mut q = vec![0.1f32; num_items * 64];
//! let mut rngs = WorkerRng::seed_workers(42, 8);
//! let mut stats = SgdStats::new(rngs.len(), 64);
//!
//! let config = SgdConfig::new(64);
//! sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded worker fan-out; without it all
//!   workers run serially on the calling thread

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data;
pub mod error;
pub mod hogwild;
pub mod kernel;
pub mod lanes;
pub mod quant;
pub mod rng;
pub mod stats;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::Interaction;
    pub use crate::error::{Error, Result};
    pub use crate::hogwild::{sgd_launch, SgdConfig};
    pub use crate::kernel::Precision;
    pub use crate::quant::Rounding;
    pub use crate::rng::WorkerRng;
    pub use crate::stats::SgdStats;
}
