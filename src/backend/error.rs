//! Error types for kernel execution.

use thiserror::Error;

/// Failure of a single kernel invocation.
///
/// Kernels are deterministic, so every variant is fatal for the current
/// residual evaluation; nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// A buffer is bound both as an output and as an input of one kernel.
    #[error("buffer '{0}' is bound as both input and output")]
    Aliased(String),

    #[error("unknown buffer id {0}")]
    UnknownBuffer(usize),

    #[error("bank {bank} out of range for buffer '{buffer}' ({nbanks} banks)")]
    BankOutOfRange {
        buffer: String,
        bank: usize,
        nbanks: usize,
    },

    #[error("shape mismatch in '{buffer}': expected {expected} values, got {actual}")]
    ShapeMismatch {
        buffer: String,
        expected: usize,
        actual: usize,
    },

    /// The peer of a halo exchange went away.
    #[error("halo link to rank {0} disconnected")]
    Disconnected(usize),

    #[error("non-finite value in '{buffer}' at element {element}")]
    NonFinite { buffer: String, element: usize },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl KernelError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(buffer: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            buffer: buffer.into(),
            expected,
            actual,
        }
    }
}
