//! Residual evaluation: configuration, setup and the stage pipeline.
//!
//! # Submodules
//!
//! - `config`: [`SolverConfig`] and its option enums
//! - `error`: [`ConfigError`], [`SetupError`], [`RhsError`]
//! - `extension`: the [`Extension`] hook and [`SourceExtension`]
//! - `pipeline`: stage sequencing per [`PipelineVariant`]
//! - `system`: [`SystemBuilder`] and [`System::rhs`]
//! - [`slots`]: kernel slot names
//!
//! # Variants
//!
//! | Variant | Output |
//! |---------|--------|
//! | `rd-blended` | -(α·divf_lo + (1-α)·divf_rd) + S |
//! | `low-order` | -divf_lo + S |
//! | `low-order-centered` | -divf_centered + S |
//! | `high-order` | -divf_rd + S |

mod config;
mod error;
mod extension;
mod pipeline;
pub mod slots;
mod system;

pub use config::{
    AntiAlias, InterfacesSection, PipelineVariant, RiemannDifferenceSection, ShockCapturing,
    SolverConfig, SolverSection,
};
pub use error::{ConfigError, RhsError, SetupError};
pub use extension::{Extension, ExtensionContext, SourceExtension};
pub use system::{System, SystemBuilder};
