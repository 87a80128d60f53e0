//! Error types for configuration, setup and residual evaluation.

use crate::backend::{KernelError, KernelGroup, ScheduleError};
use crate::mesh::{BoundaryTag, MeshError};
use thiserror::Error;

/// Invalid or missing configuration. Raised at setup only.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An option holds a value outside its allowed range or set.
    #[error("invalid value for [{section}] {key}: {reason}")]
    InvalidOption {
        section: &'static str,
        key: &'static str,
        reason: String,
    },

    /// A required option is absent.
    #[error("missing option [{section}] {key}")]
    MissingOption {
        section: &'static str,
        key: &'static str,
    },

    #[error("missing constant '{0}'")]
    MissingConstant(String),

    #[error("unsupported geometry '{0}'")]
    UnsupportedGeometry(String),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create an invalid option error.
    pub fn invalid(section: &'static str, key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            section,
            key,
            reason: reason.into(),
        }
    }
}

/// Failure while building a system.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("no boundary condition registered for tag {0}")]
    MissingBoundaryCondition(BoundaryTag),

    #[error("no halo link from rank {rank} to neighbour {peer}")]
    MissingHaloLink { rank: usize, peer: usize },

    #[error("extension '{name}' failed: {reason}")]
    Extension { name: String, reason: String },
}

/// Failure of one residual evaluation.
#[derive(Error, Debug)]
pub enum RhsError {
    /// The configured pipeline needs a kernel that does not exist.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("bank {bank} out of range ({nbanks} banks)")]
    InvalidBank { bank: usize, nbanks: usize },

    /// A required kernel slot is empty.
    #[error("missing kernel {group}/{name}")]
    MissingKernel {
        group: KernelGroup,
        name: &'static str,
    },

    /// A kernel or communication fault; every queue has been drained.
    #[error(transparent)]
    Kernel(#[from] ScheduleError),

    /// Direct buffer access outside the queues failed.
    #[error(transparent)]
    Buffer(#[from] KernelError),
}
