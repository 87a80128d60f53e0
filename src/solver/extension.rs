//! Plugins that hook kernels into the optional pipeline slots.
//!
//! The pipeline enqueues `eles/copy_soln` and `eles/source` only when they
//! are registered. An [`Extension`] fills them (and may allocate the
//! buffers those kernels need) while the system is being built.

use super::config::SolverConfig;
use super::error::{ConfigError, SetupError};
use super::slots;
use crate::backend::{BufferPool, KernelGroup, KernelTable};
use crate::elements::{CopyBuffer, ElementSet};
use crate::source::{SourceKernel, SourceTerm};
use std::sync::Arc;
use tracing::debug;

/// Setup-time access handed to extensions.
pub struct ExtensionContext<'a> {
    pub config: &'a SolverConfig,
    pub elements: &'a ElementSet,
    pub pool: &'a mut BufferPool,
    pub table: &'a mut KernelTable,
}

/// A setup hook that registers kernels.
pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    fn register(&self, ctx: &mut ExtensionContext<'_>) -> Result<(), SetupError>;
}

/// Adds a source term to the right-hand side.
///
/// Registers:
/// - `copy_soln`: input solution → `soln_copy`, taken before any output
///   bank is written
/// - `walldist` buffer, when the source asks for wall distances
/// - `source`: S(soln_copy, x, t) added to the output bank
#[derive(Debug)]
pub struct SourceExtension {
    source: Arc<dyn SourceTerm>,
}

impl SourceExtension {
    pub fn new(source: Arc<dyn SourceTerm>) -> Self {
        Self { source }
    }
}

impl Extension for SourceExtension {
    fn name(&self) -> &str {
        "source"
    }

    fn register(&self, ctx: &mut ExtensionContext<'_>) -> Result<(), SetupError> {
        let eles = ctx.elements;
        let nu = eles.ctx.points.n_upts();

        let walldist = if self.source.needs_wall_distance() {
            let geometry = ctx.config.geometry()?.ok_or(ConfigError::MissingOption {
                section: "solver",
                key: "geometry",
            })?;
            let id = ctx.pool.allocate("walldist", [eles.neles(), nu, 1], 1);
            let data = ctx.pool.bank_mut(id, 0).map_err(|e| SetupError::Extension {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;
            for (d, &(x, y)) in data.iter_mut().zip(&eles.ctx.ploc) {
                *d = geometry.distance(x, y);
            }
            debug!(%geometry, "wall distance ready");
            Some(id.plain())
        } else {
            None
        };
        let copy = ctx.pool.allocate("soln_copy", [eles.neles(), nu, eles.ctx.nvars], 1);

        ctx.table.register(
            KernelGroup::Elements,
            slots::COPY_SOLN,
            Arc::new(CopyBuffer::new(
                slots::COPY_SOLN,
                eles.buffers.scal_upts.input(),
                copy.plain(),
            )),
        );
        ctx.table.register(
            KernelGroup::Elements,
            slots::SOURCE,
            Arc::new(SourceKernel::new(
                &eles.ctx,
                Arc::clone(&self.source),
                copy.plain(),
                walldist,
                eles.buffers.scal_upts.output(),
            )),
        );
        debug!(source = self.source.name(), "source extension registered");
        Ok(())
    }
}
