//! A discretized partition and its residual entry point.

use super::config::{PipelineVariant, SolverConfig};
use super::error::{RhsError, SetupError};
use super::extension::{Extension, ExtensionContext, SourceExtension};
use super::pipeline::Pipeline;
use super::slots;
use crate::backend::{ActiveBanks, BufferPool, KernelError, KernelGroup, KernelTable, Queue, Scheduler, SchedulerStats};
use crate::boundary::BoundaryCondition;
use crate::comm::HaloEndpoint;
use crate::elements::ElementSet;
use crate::equations::{Euler2D, FluxModel, MAX_VARS};
use crate::interfaces::{BoundaryInterfaces, InteriorInterfaces, MpiInterfaces};
use crate::mesh::{BoundaryTag, PartitionMesh};
use crate::operators::RdOperators;
use crate::source::SourceTerm;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, debug_span, info};

/// Assembles a [`System`] for one partition.
///
/// # Example
/// ```ignore
/// let config = SolverConfig::default()
///     .with_order(2)
///     .with_riemann_difference(0.5)
///     .with_constant("gamma", 1.4);
/// let mut system = SystemBuilder::new(config)
///     .boundary(BoundaryTag::Wall, Arc::new(SlipWall::new((1, 2))))
///     .build(&mesh.single_partition())?;
/// system.set_solution(0, |x, y, u| u.copy_from_slice(&euler.conserved(1.0, 0.0, 0.0, 1.0)))?;
/// system.rhs(0.0, 0, 1)?;
/// ```
pub struct SystemBuilder {
    config: SolverConfig,
    model: Option<Arc<dyn FluxModel>>,
    bcs: BTreeMap<BoundaryTag, Arc<dyn BoundaryCondition>>,
    extensions: Vec<Box<dyn Extension>>,
    endpoint: Option<HaloEndpoint>,
}

impl SystemBuilder {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            model: None,
            bcs: BTreeMap::new(),
            extensions: Vec::new(),
            endpoint: None,
        }
    }

    /// Flux model. Defaults to Euler with `gamma` taken from the constants.
    pub fn model(mut self, model: Arc<dyn FluxModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Boundary condition for every face tagged `tag`.
    pub fn boundary(mut self, tag: BoundaryTag, bc: Arc<dyn BoundaryCondition>) -> Self {
        self.bcs.insert(tag, bc);
        self
    }

    pub fn extension(mut self, ext: impl Extension + 'static) -> Self {
        self.extensions.push(Box::new(ext));
        self
    }

    /// Shorthand for a [`SourceExtension`].
    pub fn source(self, source: Arc<dyn SourceTerm>) -> Self {
        self.extension(SourceExtension::new(source))
    }

    /// Halo endpoint of this partition. Without one the partition cannot
    /// have neighbours.
    pub fn endpoint(mut self, endpoint: HaloEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn build(self, part: &PartitionMesh) -> Result<System, SetupError> {
        let config = self.config;
        config.validate()?;

        let model: Arc<dyn FluxModel> = match self.model {
            Some(m) => m,
            None => Arc::new(Euler2D::from_constants(&config.constants)?),
        };
        if model.n_vars() > MAX_VARS {
            return Err(SetupError::Extension {
                name: model.name().to_string(),
                reason: format!("{} variables exceed the limit of {MAX_VARS}", model.n_vars()),
            });
        }

        let ops = RdOperators::new(config.solver.order, config.solver.solution_points);
        let mut pool = BufferPool::new();
        let mut table = KernelTable::new();
        let elements = ElementSet::new(part, ops, model, config.solver.banks, &mut pool);
        let rs = config.interfaces.riemann_solver;
        elements.register_kernels(&mut table, &config.element_options());

        let interior = InteriorInterfaces::new(part, &elements);
        interior.register_kernels(&mut table, &elements, rs);

        let boundary = BoundaryInterfaces::new(part, &elements, &self.bcs, &mut pool)?;
        boundary.register_kernels(&mut table, &elements, rs);

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| HaloEndpoint::detached(part.rank));
        let mpi = MpiInterfaces::new(part, &elements, &mut pool);
        mpi.register_kernels(&mut table, &elements, &endpoint, rs)?;

        for ext in &self.extensions {
            ext.register(&mut ExtensionContext {
                config: &config,
                elements: &elements,
                pool: &mut pool,
                table: &mut table,
            })?;
            debug!(extension = ext.name(), "extension registered");
        }

        let variant = config.variant();
        info!(
            rank = part.rank,
            %variant,
            neles = elements.neles(),
            interior_points = interior.n_pairs(),
            boundary_groups = boundary.groups().len(),
            neighbours = mpi.links().len(),
            kernels = table.len(),
            buffers = pool.len(),
            "system ready"
        );

        Ok(System {
            rank: part.rank,
            variant,
            config,
            pool,
            table,
            elements,
            boundary,
            mpi,
            scheduler: Scheduler::new(),
            compute: Queue::new("compute"),
            comm: Queue::new("comm"),
        })
    }
}

/// One partition of a discretized conservation law.
pub struct System {
    rank: usize,
    variant: PipelineVariant,
    config: SolverConfig,
    pool: BufferPool,
    table: KernelTable,
    elements: ElementSet,
    boundary: BoundaryInterfaces,
    mpi: MpiInterfaces,
    scheduler: Scheduler,
    compute: Queue,
    comm: Queue,
}

impl System {
    /// Evaluate the right-hand side of the solution in bank `inb` at time
    /// `t` into bank `outb`.
    ///
    /// Every partition of a run must call this in lockstep: the exchange
    /// stages pair each receive with the neighbour's send of the same call.
    pub fn rhs(&mut self, t: f64, inb: usize, outb: usize) -> Result<(), RhsError> {
        let _span = debug_span!("rhs", t, inb, outb, rank = self.rank).entered();

        let nbanks = self.config.solver.banks;
        if let Some(bank) = [inb, outb].into_iter().find(|&b| b >= nbanks) {
            return Err(RhsError::InvalidBank { bank, nbanks });
        }
        if self.table.contains(KernelGroup::Elements, slots::TDIVF_QPTS) {
            return Err(RhsError::NotImplemented(slots::TDIVF_QPTS));
        }

        self.compute.clear();
        self.comm.clear();
        self.boundary.prepare(&mut self.pool, t)?;
        debug!(variant = %self.variant, "evaluating");

        let mem = self.pool.memory(ActiveBanks::new(inb, outb));
        Pipeline::new(
            &self.table,
            &mut self.scheduler,
            &mut self.compute,
            &mut self.comm,
            mem,
            t,
        )
        .run(self.variant)
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn variant(&self) -> PipelineVariant {
        self.variant
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn partition_interfaces(&self) -> &MpiInterfaces {
        &self.mpi
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    pub fn table(&self) -> &KernelTable {
        &self.table
    }

    /// Kernel table, for swapping or removing kernels after setup.
    pub fn table_mut(&mut self) -> &mut KernelTable {
        &mut self.table
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Fill a solution bank from a function of position.
    pub fn set_solution(&mut self, bank: usize, f: impl Fn(f64, f64, &mut [f64])) -> Result<(), KernelError> {
        self.elements.set_solution(&mut self.pool, bank, f)
    }

    pub fn solution(&self, bank: usize) -> Result<&[f64], KernelError> {
        self.pool.bank(self.elements.buffers.scal_upts, bank)
    }

    /// Blend coefficient per element from the last evaluation.
    pub fn alpha(&self) -> Result<&[f64], KernelError> {
        self.pool.bank(self.elements.buffers.alpha, 0)
    }

    /// Smoothed sensor field per solution point from the last evaluation.
    pub fn residual(&self) -> Result<&[f64], KernelError> {
        self.pool.bank(self.elements.buffers.residual, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::Advection2D;
    use crate::mesh::Mesh2D;

    fn advection_system(config: SolverConfig) -> System {
        let mesh = Mesh2D::uniform_periodic(0.0, 1.0, 0.0, 1.0, 3, 3);
        SystemBuilder::new(config)
            .model(Arc::new(Advection2D::new(1.0, 0.5)))
            .build(&mesh.single_partition())
            .unwrap()
    }

    #[test]
    fn test_invalid_bank_is_rejected_before_work() {
        let mut system = advection_system(SolverConfig::default());
        let err = system.rhs(0.0, 0, 2).unwrap_err();
        assert!(matches!(err, RhsError::InvalidBank { bank: 2, nbanks: 2 }));
        assert_eq!(system.scheduler_stats().barriers, 0);
    }

    #[test]
    fn test_default_model_needs_gamma() {
        let mesh = Mesh2D::uniform_periodic(0.0, 1.0, 0.0, 1.0, 2, 2);
        let err = SystemBuilder::new(SolverConfig::default())
            .build(&mesh.single_partition())
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::Config(_)));

        SystemBuilder::new(SolverConfig::default().with_constant("gamma", 1.4))
            .build(&mesh.single_partition())
            .unwrap();
    }

    #[test]
    fn test_missing_required_kernel() {
        let mut system = advection_system(SolverConfig::default());
        system.table_mut().remove(KernelGroup::Elements, slots::RIEMANN_DIFFERENCE);
        let err = system.rhs(0.0, 0, 1).unwrap_err();
        assert!(matches!(
            err,
            RhsError::MissingKernel { name: "riemanndifference", .. }
        ));
    }
}
