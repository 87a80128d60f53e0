//! Stage sequencing of one residual evaluation.
//!
//! Two queues: `compute` for element and interface kernels, `comm` for
//! the partition exchange. A stage is a run of enqueues closed by a
//! barrier. While the comm queue sends and receives the face values of
//! one stage, the compute queue works through everything that does not
//! depend on remote data.
//!
//! Partition (`mpiint`) and boundary (`bcint`) slots are always optional:
//! a single-partition system has no partition interfaces and a periodic
//! one has no boundary faces.

use super::config::PipelineVariant;
use super::error::RhsError;
use super::slots;
use crate::backend::{KernelGroup, KernelMemory, KernelTable, LaunchArgs, Queue, Scheduler};
use tracing::{debug, trace};

use KernelGroup::{BoundaryInterfaces as Bcint, Elements as Eles, InteriorInterfaces as Iint, MpiInterfaces as Mpiint};

/// Flux law of a low-order pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoFlux {
    Upwind,
    Centered,
}

impl LoFlux {
    fn divf(self) -> &'static str {
        match self {
            LoFlux::Upwind => slots::DIVF_LO,
            LoFlux::Centered => slots::DIVF_CENTERED,
        }
    }

    fn comm_flux(self) -> &'static str {
        match self {
            LoFlux::Upwind => slots::COMM_FLUX,
            LoFlux::Centered => slots::COMM_FLUX_CENTERED,
        }
    }

    fn correction(self) -> &'static str {
        match self {
            LoFlux::Upwind => slots::TDIVTCONF_LO,
            LoFlux::Centered => slots::TDIVTCONF_CENTERED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Compute,
    Comm,
}

/// Queues and memory of one residual evaluation.
pub(crate) struct Pipeline<'a, 'm> {
    table: &'a KernelTable,
    scheduler: &'a mut Scheduler,
    compute: &'a mut Queue,
    comm: &'a mut Queue,
    mem: KernelMemory<'m>,
    args: LaunchArgs,
    soln_copied: bool,
}

impl<'a, 'm> Pipeline<'a, 'm> {
    pub(crate) fn new(
        table: &'a KernelTable,
        scheduler: &'a mut Scheduler,
        compute: &'a mut Queue,
        comm: &'a mut Queue,
        mem: KernelMemory<'m>,
        time: f64,
    ) -> Self {
        Self {
            table,
            scheduler,
            compute,
            comm,
            mem,
            args: LaunchArgs::at(time),
            soln_copied: false,
        }
    }

    /// Run every stage of `variant`.
    pub(crate) fn run(mut self, variant: PipelineVariant) -> Result<(), RhsError> {
        match variant {
            PipelineVariant::RdBlended => {
                self.low_order(LoFlux::Upwind)?;
                self.sensor()?;
                self.high_order(true)?;
                self.push(Eles, slots::BLEND_INT_FLUX)?;
                self.push(Eles, slots::TDIVTCONF_RD)?;
                self.push(Eles, slots::BLEND_DIVF)?;
                self.assemble(slots::NEGDIVCONF)
            }
            PipelineVariant::LowOrder => {
                self.low_order(LoFlux::Upwind)?;
                self.sensor()?;
                self.assemble(slots::NEGDIVCONF_LO)
            }
            PipelineVariant::LowOrderCentered => {
                self.low_order(LoFlux::Centered)?;
                self.assemble(slots::NEGDIVCONF_CENTERED)
            }
            PipelineVariant::HighOrder => {
                self.high_order(false)?;
                self.push(Eles, slots::TDIVTCONF_RD)?;
                self.assemble(slots::NEGDIVCONF_RD)
            }
        }
    }

    /// Low-order subcell pass: extrapolate, exchange, flux, correct.
    fn low_order(&mut self, flux: LoFlux) -> Result<(), RhsError> {
        self.push(Eles, slots::DISU_LO_EXT)?;
        self.push_optional(Target::Compute, Mpiint, slots::SCAL_FPTS_PACK);
        self.barrier("lo-extrapolate")?;

        self.push(Eles, slots::DISU_LO_INT)?;
        self.copy_soln();
        self.push(Eles, flux.divf())?;
        self.push(Iint, flux.comm_flux())?;
        self.push_optional(Target::Compute, Bcint, flux.comm_flux());
        self.exchange();
        self.barrier("lo-flux")?;

        self.push_optional(Target::Compute, Mpiint, flux.comm_flux());
        self.push(Eles, flux.correction())?;
        if flux == LoFlux::Upwind {
            self.push_optional(Target::Compute, Eles, slots::COPY_SOLN_AT_FPTS);
        }
        self.barrier("lo-correct")
    }

    /// Residual sensor: centered pass, then normalization into α.
    fn sensor(&mut self) -> Result<(), RhsError> {
        self.push(Eles, slots::RESIDUAL)?;
        self.push(Eles, slots::DISU_LO_EXT)?;
        self.push_optional(Target::Compute, Mpiint, slots::SCAL_FPTS_PACK);
        self.barrier("residual")?;

        self.push(Eles, slots::DISU_LO_INT)?;
        self.push(Eles, slots::DIVF_CENTERED)?;
        self.push(Iint, slots::COMM_FLUX_CENTERED)?;
        self.push_optional(Target::Compute, Bcint, slots::COMM_FLUX_CENTERED);
        self.exchange();
        self.barrier("centered-flux")?;

        self.push_optional(Target::Compute, Mpiint, slots::COMM_FLUX_CENTERED);
        self.push(Eles, slots::TDIVTCONF_CENTERED)?;
        self.push(Eles, slots::NORMALIZE_RESIDUAL)?;
        self.barrier("normalize")
    }

    /// High-order residual-distribution pass. Leaves the final partition
    /// flux enqueued so the blend runs in the same barrier.
    fn high_order(&mut self, limit: bool) -> Result<(), RhsError> {
        self.push(Eles, slots::DISU_HO_EXT)?;
        if limit {
            self.push_optional(Target::Compute, Eles, slots::LIMITINTERP_EXT);
        }
        self.push_optional(Target::Compute, Mpiint, slots::SCAL_FPTS_PACK);
        self.barrier("ho-extrapolate")?;

        self.push(Eles, slots::DISU_HO_INT)?;
        if limit {
            self.push_optional(Target::Compute, Eles, slots::LIMITINTERP_INT);
        }
        self.copy_soln();
        self.push(Iint, slots::COMM_FLUX)?;
        self.push_optional(Target::Compute, Bcint, slots::COMM_FLUX);
        self.push(Eles, slots::RIEMANN_DIFFERENCE)?;
        self.exchange();
        self.barrier("ho-flux")?;

        self.push_optional(Target::Compute, Mpiint, slots::COMM_FLUX);
        Ok(())
    }

    /// Negate the divergence into the output bank and add sources.
    fn assemble(&mut self, negdivconf: &'static str) -> Result<(), RhsError> {
        self.push(Eles, negdivconf)?;
        self.push_optional(Target::Compute, Eles, slots::SOURCE);
        self.barrier("assemble")?;
        trace!(stats = ?self.scheduler.stats(), "scheduler");
        Ok(())
    }

    fn exchange(&mut self) {
        for name in [slots::SCAL_FPTS_SEND, slots::SCAL_FPTS_RECV, slots::SCAL_FPTS_UNPACK] {
            self.push_optional(Target::Comm, Mpiint, name);
        }
    }

    /// Solution copy for sources, taken once before the output is written.
    fn copy_soln(&mut self) {
        if !self.soln_copied {
            self.push_optional(Target::Compute, Eles, slots::COPY_SOLN);
            self.soln_copied = true;
        }
    }

    fn push(&mut self, group: KernelGroup, name: &'static str) -> Result<(), RhsError> {
        if self.push_optional(Target::Compute, group, name) {
            Ok(())
        } else {
            Err(RhsError::MissingKernel { group, name })
        }
    }

    fn push_optional(&mut self, target: Target, group: KernelGroup, name: &'static str) -> bool {
        let Some(kernels) = self.table.slot(group, name) else {
            return false;
        };
        let queue = match target {
            Target::Compute => &mut *self.compute,
            Target::Comm => &mut *self.comm,
        };
        queue.enqueue_all(kernels, self.args);
        true
    }

    fn barrier(&mut self, stage: &'static str) -> Result<(), RhsError> {
        debug!(stage, compute = self.compute.len(), comm = self.comm.len(), "barrier");
        if self.comm.is_empty() {
            self.scheduler.run_all(&mut [&mut *self.compute], &mut self.mem)?;
        } else {
            self.scheduler
                .run_all(&mut [&mut *self.compute, &mut *self.comm], &mut self.mem)?;
        }
        Ok(())
    }
}
