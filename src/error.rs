//! Error types for factr

use thiserror::Error;

/// Result type alias using factr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when configuring or launching an SGD kernel
#[derive(Error, Debug)]
pub enum Error {
    /// Factor array length is not a multiple of the vector width `k`
    #[error("Factor array '{name}' has {len} elements, not a multiple of k = {k}")]
    FactorShape {
        /// Which factor array ("p" or "q")
        name: &'static str,
        /// Actual element count
        len: usize,
        /// Configured vector width
        k: usize,
    },

    /// An interaction addresses a row outside the factor matrices
    #[error("Interaction {index} addresses {side} row {row}, but only {rows} rows exist")]
    RowOutOfBounds {
        /// Position of the offending interaction
        index: usize,
        /// "user" or "item"
        side: &'static str,
        /// The out-of-range row
        row: usize,
        /// Number of rows available
        rows: usize,
    },

    /// Worker-indexed buffers disagree on the worker count
    #[error("Worker count mismatch: {rngs} RNG states vs {norm_slots} sum_norms slots")]
    WorkerMismatch {
        /// Number of per-worker RNG states
        rngs: usize,
        /// Number of per-worker norm accumulator slots
        norm_slots: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a factor shape error
    pub fn factor_shape(name: &'static str, len: usize, k: usize) -> Self {
        Self::FactorShape { name, len, k }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
