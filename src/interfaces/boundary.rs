//! Faces on the domain boundary.
//!
//! Face points are grouped by boundary tag. Each group owns an
//! external-state buffer `[npts, 1, nvars]` that [`BoundaryInterfaces::prepare`]
//! fills from its boundary condition before any kernel runs.

use super::fpt_slot;
use crate::backend::{
    Binding, BufferId, BufferPool, Kernel, KernelError, KernelGroup, KernelMemory, KernelTable,
    LaunchArgs, Progress,
};
use crate::boundary::{BoundaryCondition, BoundaryContext};
use crate::elements::{ElementSet, check_len};
use crate::equations::{FluxModel, MAX_VARS};
use crate::flux::{FaceFlux, RiemannSolver};
use crate::mesh::{BoundaryTag, PartitionMesh};
use crate::solver::{SetupError, slots};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// One face point on the boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryPoint {
    pub slot: usize,
    pub normal: (f64, f64),
    pub position: (f64, f64),
}

/// Face points sharing one boundary condition.
#[derive(Clone, Debug)]
pub struct BoundaryGroup {
    pub tag: BoundaryTag,
    pub bc: Arc<dyn BoundaryCondition>,
    pub points: Arc<Vec<BoundaryPoint>>,
    /// Prepared external state
    pub ext: BufferId,
}

/// Boundary interfaces of one partition.
#[derive(Clone, Debug, Default)]
pub struct BoundaryInterfaces {
    groups: Vec<BoundaryGroup>,
}

impl BoundaryInterfaces {
    /// Group boundary faces by tag. Every tag present on this partition needs
    /// a condition in `bcs`.
    pub fn new(
        part: &PartitionMesh,
        elements: &ElementSet,
        bcs: &BTreeMap<BoundaryTag, Arc<dyn BoundaryCondition>>,
        pool: &mut BufferPool,
    ) -> Result<Self, SetupError> {
        let ctx = &*elements.ctx;
        let mut points: BTreeMap<BoundaryTag, Vec<BoundaryPoint>> = BTreeMap::new();
        for (face, tag) in &part.boundary {
            let verts = &part.element_vertices[face.element];
            let normal = ctx.metrics[face.element].normals[face.face];
            let group = points.entry(*tag).or_default();
            for m in 0..ctx.points.n_1d {
                group.push(BoundaryPoint {
                    slot: fpt_slot(ctx, face.element, face.face, m),
                    normal,
                    position: ctx.face_point_location(verts, face.face, m),
                });
            }
        }

        let mut groups = Vec::with_capacity(points.len());
        for (tag, pts) in points {
            let bc = bcs
                .get(&tag)
                .ok_or(SetupError::MissingBoundaryCondition(tag))?;
            let ext = pool.allocate(format!("bc_ext_{tag}"), [pts.len(), 1, ctx.nvars], 1);
            debug!(%tag, bc = bc.name(), npts = pts.len(), "boundary group");
            groups.push(BoundaryGroup {
                tag,
                bc: Arc::clone(bc),
                points: Arc::new(pts),
                ext,
            });
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[BoundaryGroup] {
        &self.groups
    }

    /// Evaluate every external state at time `t`.
    pub fn prepare(&self, pool: &mut BufferPool, t: f64) -> Result<(), KernelError> {
        for g in &self.groups {
            let nv = pool.buffer(g.ext)?.shape()[2];
            let ext = pool.bank_mut(g.ext, 0)?;
            for (p, state) in g.points.iter().zip(ext.chunks_mut(nv)) {
                g.bc.prepare(p.position, t, state);
            }
        }
        Ok(())
    }

    pub fn register_kernels(&self, table: &mut KernelTable, elements: &ElementSet, rs: RiemannSolver) {
        let fpts = elements.buffers.scal_fpts.plain();
        let fpts_len = elements.ctx.neles * elements.ctx.fpts_stride();
        for g in &self.groups {
            for (name, flux) in [
                (slots::COMM_FLUX, FaceFlux::Upwind(rs)),
                (slots::COMM_FLUX_CENTERED, FaceFlux::Centered),
            ] {
                table.register(
                    KernelGroup::BoundaryInterfaces,
                    name,
                    Arc::new(BoundaryFlux {
                        name,
                        model: Arc::clone(&elements.ctx.model),
                        flux,
                        bc: Arc::clone(&g.bc),
                        points: Arc::clone(&g.points),
                        ext: g.ext.plain(),
                        fpts,
                        fpts_len,
                    }),
                );
            }
        }
    }
}

/// Common flux between the interior state and the boundary ghost state.
pub struct BoundaryFlux {
    name: &'static str,
    model: Arc<dyn FluxModel>,
    flux: FaceFlux,
    bc: Arc<dyn BoundaryCondition>,
    points: Arc<Vec<BoundaryPoint>>,
    ext: Binding,
    fpts: Binding,
    fpts_len: usize,
}

impl Kernel for BoundaryFlux {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, args: &LaunchArgs) -> Result<Progress, KernelError> {
        let nv = self.model.n_vars();
        let time = args.time_or_zero();
        mem.with_output(self.fpts, |fpts, inputs| {
            let ext = inputs.read(self.ext)?;
            check_len("scal_fpts", fpts, self.fpts_len)?;
            check_len("bc_ext", ext, self.points.len() * nv)?;

            let (mut ul, mut ghost, mut f) = ([0.0; MAX_VARS], [0.0; MAX_VARS], [0.0; MAX_VARS]);
            for (k, p) in self.points.iter().enumerate() {
                let at = p.slot * nv;
                ul[..nv].copy_from_slice(&fpts[at..at + nv]);
                let bctx = BoundaryContext {
                    time,
                    position: p.position,
                    interior: &ul[..nv],
                    external: &ext[k * nv..(k + 1) * nv],
                    normal: p.normal,
                };
                self.bc.ghost_state(&bctx, &mut ghost[..nv]);
                self.flux
                    .flux(self.model.as_ref(), &ul[..nv], &ghost[..nv], p.normal, &mut f[..nv]);
                fpts[at..at + nv].copy_from_slice(&f[..nv]);
            }
            Ok(Progress::Done)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ActiveBanks;
    use crate::boundary::{Extrapolate, FixedState};
    use crate::equations::Advection2D;
    use crate::mesh::Mesh2D;
    use crate::operators::RdOperators;
    use crate::polynomial::PointLayout;

    fn channel() -> (PartitionMesh, ElementSet, BufferPool) {
        let mesh = Mesh2D::channel_periodic_x(0.0, 2.0, 0.0, 1.0, 2, 1, BoundaryTag::Inflow, BoundaryTag::Outflow);
        let part = mesh.single_partition();
        let mut pool = BufferPool::new();
        let set = ElementSet::new(
            &part,
            RdOperators::new(1, PointLayout::GaussLegendre),
            Arc::new(Advection2D::new(0.0, 1.0)),
            1,
            &mut pool,
        );
        (part, set, pool)
    }

    #[test]
    fn test_missing_condition_is_reported() {
        let (part, set, mut pool) = channel();
        let mut bcs: BTreeMap<BoundaryTag, Arc<dyn BoundaryCondition>> = BTreeMap::new();
        bcs.insert(BoundaryTag::Inflow, Arc::new(FixedState::new(vec![1.0])));
        let err = BoundaryInterfaces::new(&part, &set, &bcs, &mut pool).unwrap_err();
        assert!(matches!(err, SetupError::MissingBoundaryCondition(BoundaryTag::Outflow)));
    }

    #[test]
    fn test_inflow_and_outflow_fluxes() {
        let (part, set, mut pool) = channel();
        let mut bcs: BTreeMap<BoundaryTag, Arc<dyn BoundaryCondition>> = BTreeMap::new();
        bcs.insert(BoundaryTag::Inflow, Arc::new(FixedState::new(vec![2.0])));
        bcs.insert(BoundaryTag::Outflow, Arc::new(Extrapolate));
        let bcint = BoundaryInterfaces::new(&part, &set, &bcs, &mut pool).unwrap();
        assert_eq!(bcint.groups().len(), 2);

        bcint.prepare(&mut pool, 0.0).unwrap();
        pool.bank_mut(set.buffers.scal_fpts, 0).unwrap().fill(0.5);

        let mut table = KernelTable::new();
        bcint.register_kernels(&mut table, &set, RiemannSolver::Rusanov);
        let mut mem = pool.memory(ActiveBanks::default());
        for k in table.slot(KernelGroup::BoundaryInterfaces, slots::COMM_FLUX).unwrap() {
            k.run(&mut mem, &LaunchArgs::at(0.0)).unwrap();
        }

        let fpts = mem.read(set.buffers.scal_fpts.plain()).unwrap();
        for g in bcint.groups() {
            for p in g.points.iter() {
                match g.tag {
                    // Inflow through the south wall (n = -y): upwind picks the ghost
                    BoundaryTag::Inflow => assert!((fpts[p.slot] + 2.0).abs() < 1e-14),
                    // Outflow through the north wall: interior state leaves
                    _ => assert!((fpts[p.slot] - 0.5).abs() < 1e-14),
                }
            }
        }
    }
}
