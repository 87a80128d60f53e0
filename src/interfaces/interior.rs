//! Faces shared by two elements of the same partition.

use super::fpt_slot;
use crate::backend::{Binding, Kernel, KernelError, KernelGroup, KernelMemory, KernelTable, LaunchArgs, Progress};
use crate::elements::{ElementSet, check_len};
use crate::equations::{FluxModel, MAX_VARS};
use crate::flux::{FaceFlux, RiemannSolver};
use crate::mesh::PartitionMesh;
use crate::solver::slots;
use std::sync::Arc;

/// Two face points that coincide, seen from either element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacePair {
    pub lhs: usize,
    pub rhs: usize,
    /// Outward unit normal of the left element
    pub normal: (f64, f64),
}

/// Interior interfaces of one partition.
#[derive(Clone, Debug)]
pub struct InteriorInterfaces {
    pairs: Arc<Vec<FacePair>>,
}

impl InteriorInterfaces {
    pub fn new(part: &PartitionMesh, elements: &ElementSet) -> Self {
        let ctx = &*elements.ctx;
        let n = ctx.points.n_1d;
        let mut pairs = Vec::with_capacity(part.interior.len() * n);
        for (l, r) in &part.interior {
            let normal = ctx.metrics[l.element].normals[l.face];
            for m in 0..n {
                pairs.push(FacePair {
                    lhs: fpt_slot(ctx, l.element, l.face, m),
                    rhs: fpt_slot(ctx, r.element, r.face, ctx.points.paired(m)),
                    normal,
                });
            }
        }
        Self {
            pairs: Arc::new(pairs),
        }
    }

    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn register_kernels(&self, table: &mut KernelTable, elements: &ElementSet, rs: RiemannSolver) {
        let model = Arc::clone(&elements.ctx.model);
        let fpts = elements.buffers.scal_fpts.plain();
        let fpts_len = elements.ctx.neles * elements.ctx.fpts_stride();
        for (name, flux) in [
            (slots::COMM_FLUX, FaceFlux::Upwind(rs)),
            (slots::COMM_FLUX_CENTERED, FaceFlux::Centered),
        ] {
            table.register(
                KernelGroup::InteriorInterfaces,
                name,
                Arc::new(InteriorFlux {
                    name,
                    model: Arc::clone(&model),
                    flux,
                    pairs: Arc::clone(&self.pairs),
                    fpts,
                    fpts_len,
                }),
            );
        }
    }
}

/// Writes F*(u_l, u_r; n_l) to the left point and -F* to the right one.
pub struct InteriorFlux {
    name: &'static str,
    model: Arc<dyn FluxModel>,
    flux: FaceFlux,
    pairs: Arc<Vec<FacePair>>,
    fpts: Binding,
    fpts_len: usize,
}

impl Kernel for InteriorFlux {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let nv = self.model.n_vars();
        mem.with_output(self.fpts, |fpts, _| {
            check_len("scal_fpts", fpts, self.fpts_len)?;
            let (mut ul, mut ur, mut f) = ([0.0; MAX_VARS], [0.0; MAX_VARS], [0.0; MAX_VARS]);
            for pair in self.pairs.iter() {
                let (l, r) = (pair.lhs * nv, pair.rhs * nv);
                ul[..nv].copy_from_slice(&fpts[l..l + nv]);
                ur[..nv].copy_from_slice(&fpts[r..r + nv]);
                self.flux
                    .flux(self.model.as_ref(), &ul[..nv], &ur[..nv], pair.normal, &mut f[..nv]);
                for v in 0..nv {
                    fpts[l + v] = f[v];
                    fpts[r + v] = -f[v];
                }
            }
            Ok(Progress::Done)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActiveBanks, BufferPool};
    use crate::equations::Advection2D;
    use crate::mesh::Mesh2D;
    use crate::operators::RdOperators;
    use crate::polynomial::PointLayout;

    #[test]
    fn test_common_flux_is_conservative() {
        let mesh = Mesh2D::uniform_periodic(0.0, 1.0, 0.0, 1.0, 2, 2);
        let part = mesh.single_partition();
        let mut pool = BufferPool::new();
        let model = Arc::new(Advection2D::new(1.0, 0.5));
        let set = ElementSet::new(&part, RdOperators::new(1, PointLayout::GaussLegendre), model, 1, &mut pool);
        let iint = InteriorInterfaces::new(&part, &set);
        // Fully periodic: every face point is in exactly one pair
        assert_eq!(iint.n_pairs() * 2, 4 * set.ctx.points.n_fpts());

        let mut table = KernelTable::new();
        iint.register_kernels(&mut table, &set, RiemannSolver::Rusanov);
        let fpts_id = set.buffers.scal_fpts;
        for (i, v) in pool.bank_mut(fpts_id, 0).unwrap().iter_mut().enumerate() {
            *v = (i as f64 * 0.37).sin();
        }

        let mut mem = pool.memory(ActiveBanks::default());
        let kernel = &table.slot(KernelGroup::InteriorInterfaces, slots::COMM_FLUX).unwrap()[0];
        kernel.run(&mut mem, &LaunchArgs::default()).unwrap();

        let fpts = mem.read(fpts_id.plain()).unwrap();
        let total: f64 = fpts.iter().sum();
        assert!(total.abs() < 1e-13);
    }
}
