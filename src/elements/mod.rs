//! Quadrilateral element set and its kernels.
//!
//! An [`ElementSet`] owns the per-element buffers of one partition and the
//! immutable data its kernels share: operator matrices, affine metrics,
//! physical point locations and the mask of partition-boundary faces.
//!
//! Kernels work line by line. Along each line of constant η (direction ξ)
//! and of constant ξ (direction η) the p+1 solution points are the centres
//! of p+1 finite-volume subcells bounded by the p+2 extended points. The
//! contravariant flux G = ∇ξ·F is evaluated at the extended points and
//! differentiated with either the subcell (low-order) or the RD
//! (high-order) matrix.

mod blend;
mod divergence;
mod extrapolate;
mod sensor;

pub use blend::{BlendDivergence, BlendInterfaceFlux, CopyBuffer, NegDivConf, Unsupported};
pub use divergence::{Correction, InterfaceCorrection, RiemannDifference, SubcellDivergence};
pub use extrapolate::{Extrapolate, FaceSubset, Reconstruction};
pub use sensor::{LimitInterp, NormalizeResidual, Residual, SENSOR_TOL};

use crate::backend::{BufferId, BufferPool, Kernel, KernelError, KernelGroup, KernelTable};
use crate::equations::FluxModel;
use crate::flux::{FaceFlux, RiemannSolver};
use crate::mesh::PartitionMesh;
use crate::operators::{ElementMetrics, LineDir, QuadPoints, RdOperators, reference_to_physical};
use crate::solver::slots;
use std::sync::Arc;
use tracing::info;

/// Immutable data shared by every kernel of an element set.
#[derive(Debug)]
pub struct ElementContext {
    pub ops: RdOperators,
    pub points: QuadPoints,
    pub neles: usize,
    pub nvars: usize,
    pub metrics: Vec<ElementMetrics>,
    /// Physical solution point locations, `[neles * nupts]`
    pub ploc: Vec<(f64, f64)>,
    /// Faces that lie on a partition boundary
    pub ext_faces: Vec<[bool; 4]>,
    pub model: Arc<dyn FluxModel>,
}

impl ElementContext {
    /// Values per element of a solution-point buffer.
    #[inline]
    pub fn upts_stride(&self) -> usize {
        self.points.n_upts() * self.nvars
    }

    /// Values per element of a face-point buffer.
    #[inline]
    pub fn fpts_stride(&self) -> usize {
        self.points.n_fpts() * self.nvars
    }

    /// Physical location of face point `m` of `face` on the element `verts`.
    pub fn face_point_location(&self, verts: &[(f64, f64); 4], face: usize, m: usize) -> (f64, f64) {
        let end = self.points.line_end(face, m);
        let s = self.ops.nodes[end.line];
        let edge = if end.high { 1.0 } else { -1.0 };
        match end.dir {
            LineDir::Xi => reference_to_physical(verts, edge, s),
            LineDir::Eta => reference_to_physical(verts, s, edge),
        }
    }
}

/// Buffer handles owned by an element set.
#[derive(Clone, Copy, Debug)]
pub struct ElementBuffers {
    /// Banked solution `[neles, nupts, nvars]`
    pub scal_upts: BufferId,
    /// Face values, overwritten in place by common fluxes `[neles, nfpts, nvars]`
    pub scal_fpts: BufferId,
    /// Copy of the low-order common flux
    pub scal_fpts_cpy: BufferId,
    pub divf_lo: BufferId,
    pub divf_centered: BufferId,
    pub divf_rd: BufferId,
    /// Sensor field `[neles, nupts, 1]`
    pub residual: BufferId,
    /// Blend coefficient `[neles, 1, 1]`
    pub alpha: BufferId,
}

/// Element kernels to build, derived from the solver configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementKernelOptions {
    pub riemann_solver: RiemannSolver,
    /// Sensor threshold; enables the sensor and limiter kernels
    pub e_max: Option<f64>,
    /// Fixed blend coefficient overriding the sensor
    pub fixed_alpha: Option<f64>,
    /// Register the quadrature-point divergence slot
    pub anti_alias: bool,
}

/// All elements of one partition.
#[derive(Debug)]
pub struct ElementSet {
    pub ctx: Arc<ElementContext>,
    pub buffers: ElementBuffers,
}

impl ElementSet {
    /// Build geometry and allocate buffers in `pool`.
    pub fn new(
        part: &PartitionMesh,
        ops: RdOperators,
        model: Arc<dyn FluxModel>,
        nbanks: usize,
        pool: &mut BufferPool,
    ) -> Self {
        let points = QuadPoints::new(ops.order);
        let neles = part.n_elements();
        let nvars = model.n_vars();
        let (nu, nf) = (points.n_upts(), points.n_fpts());

        let metrics: Vec<_> = part
            .element_vertices
            .iter()
            .map(ElementMetrics::from_vertices)
            .collect();

        let mut ploc = Vec::with_capacity(neles * nu);
        for verts in &part.element_vertices {
            for j in 0..points.n_1d {
                for i in 0..points.n_1d {
                    ploc.push(reference_to_physical(verts, ops.nodes[i], ops.nodes[j]));
                }
            }
        }

        let mut ext_faces = vec![[false; 4]; neles];
        for rf in &part.remote {
            ext_faces[rf.face.element][rf.face.face] = true;
        }

        let buffers = ElementBuffers {
            scal_upts: pool.allocate("scal_upts", [neles, nu, nvars], nbanks),
            scal_fpts: pool.allocate("scal_fpts", [neles, nf, nvars], 1),
            scal_fpts_cpy: pool.allocate("scal_fpts_cpy", [neles, nf, nvars], 1),
            divf_lo: pool.allocate("divf_lo", [neles, nu, nvars], 1),
            divf_centered: pool.allocate("divf_centered", [neles, nu, nvars], 1),
            divf_rd: pool.allocate("divf_rd", [neles, nu, nvars], 1),
            residual: pool.allocate("residual", [neles, nu, 1], 1),
            alpha: pool.allocate("alpha", [neles, 1, 1], 1),
        };

        info!(
            rank = part.rank,
            neles,
            order = ops.order,
            nupts = nu,
            nfpts = nf,
            model = model.name(),
            "element set ready"
        );

        Self {
            ctx: Arc::new(ElementContext {
                ops,
                points,
                neles,
                nvars,
                metrics,
                ploc,
                ext_faces,
                model,
            }),
            buffers,
        }
    }

    /// Register every element kernel in the table.
    pub fn register_kernels(&self, table: &mut KernelTable, opts: &ElementKernelOptions) {
        let b = self.buffers;
        let ctx = &self.ctx;
        let u = b.scal_upts.input();
        let fpts = b.scal_fpts.plain();
        let out = b.scal_upts.output();
        let mut add = |name: &'static str, k: Arc<dyn Kernel>| {
            table.register(KernelGroup::Elements, name, k);
        };

        for (name, recon, subset) in [
            (slots::DISU_LO_EXT, Reconstruction::Low, FaceSubset::Partition),
            (slots::DISU_LO_INT, Reconstruction::Low, FaceSubset::Local),
            (slots::DISU_HO_EXT, Reconstruction::High, FaceSubset::Partition),
            (slots::DISU_HO_INT, Reconstruction::High, FaceSubset::Local),
        ] {
            add(name, Arc::new(Extrapolate::new(name, ctx, recon, subset, u, fpts)));
        }

        let upwind = FaceFlux::Upwind(opts.riemann_solver);
        add(
            slots::DIVF_LO,
            Arc::new(SubcellDivergence::new(slots::DIVF_LO, ctx, upwind, u, b.divf_lo.plain())),
        );
        add(
            slots::DIVF_CENTERED,
            Arc::new(SubcellDivergence::new(
                slots::DIVF_CENTERED,
                ctx,
                FaceFlux::Centered,
                u,
                b.divf_centered.plain(),
            )),
        );
        for (name, correction, target) in [
            (slots::TDIVTCONF_LO, Correction::Subcell, b.divf_lo),
            (slots::TDIVTCONF_CENTERED, Correction::Subcell, b.divf_centered),
            (slots::TDIVTCONF_RD, Correction::ResidualDistribution, b.divf_rd),
        ] {
            add(
                name,
                Arc::new(InterfaceCorrection::new(name, ctx, correction, fpts, target.plain())),
            );
        }
        add(
            slots::RIEMANN_DIFFERENCE,
            Arc::new(RiemannDifference::new(ctx, u, b.divf_rd.plain())),
        );

        add(
            slots::COPY_SOLN_AT_FPTS,
            Arc::new(CopyBuffer::new(slots::COPY_SOLN_AT_FPTS, fpts, b.scal_fpts_cpy.plain())),
        );
        add(
            slots::BLEND_INT_FLUX,
            Arc::new(BlendInterfaceFlux::new(ctx, b.alpha.plain(), b.scal_fpts_cpy.plain(), fpts)),
        );
        add(
            slots::BLEND_DIVF,
            Arc::new(BlendDivergence::new(
                ctx,
                b.alpha.plain(),
                b.divf_lo.plain(),
                b.divf_rd.plain(),
                out,
            )),
        );
        add(slots::NEGDIVCONF, Arc::new(NegDivConf::new(slots::NEGDIVCONF, ctx, None, out)));
        for (name, src) in [
            (slots::NEGDIVCONF_LO, b.divf_lo),
            (slots::NEGDIVCONF_CENTERED, b.divf_centered),
            (slots::NEGDIVCONF_RD, b.divf_rd),
        ] {
            add(name, Arc::new(NegDivConf::new(name, ctx, Some(src.plain()), out)));
        }

        if let Some(e_max) = opts.e_max {
            add(
                slots::RESIDUAL,
                Arc::new(Residual::new(ctx, b.divf_lo.plain(), b.residual.plain())),
            );
            add(
                slots::NORMALIZE_RESIDUAL,
                Arc::new(NormalizeResidual::new(
                    ctx,
                    e_max,
                    opts.fixed_alpha,
                    b.divf_centered.plain(),
                    b.residual.plain(),
                    b.alpha.plain(),
                )),
            );
            for (name, subset) in [
                (slots::LIMITINTERP_EXT, FaceSubset::Partition),
                (slots::LIMITINTERP_INT, FaceSubset::Local),
            ] {
                add(name, Arc::new(LimitInterp::new(name, ctx, subset, e_max, u, fpts)));
            }
        }

        if opts.anti_alias {
            add(slots::TDIVF_QPTS, Arc::new(Unsupported::new(slots::TDIVF_QPTS)));
        }
    }

    pub fn neles(&self) -> usize {
        self.ctx.neles
    }

    /// Fill a bank of the solution from a function of position.
    pub fn set_solution(
        &self,
        pool: &mut BufferPool,
        bank: usize,
        f: impl Fn(f64, f64, &mut [f64]),
    ) -> Result<(), KernelError> {
        let nv = self.ctx.nvars;
        let data = pool.bank_mut(self.buffers.scal_upts, bank)?;
        for (state, &(x, y)) in data.chunks_mut(nv).zip(&self.ctx.ploc) {
            f(x, y, state);
        }
        Ok(())
    }
}

/// Check that a buffer holds `expected` values.
pub(crate) fn check_len(name: &str, data: &[f64], expected: usize) -> Result<(), KernelError> {
    if data.len() == expected {
        Ok(())
    } else {
        Err(KernelError::shape_mismatch(name, expected, data.len()))
    }
}

/// Apply `f` to every element-sized chunk of `out`, in parallel when the
/// `parallel` feature is enabled.
pub(crate) fn for_each_element<F>(out: &mut [f64], stride: usize, f: F)
where
    F: Fn(usize, &mut [f64]) + Send + Sync,
{
    if stride == 0 {
        return;
    }
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(e, chunk)| f(e, chunk));
    }
    #[cfg(not(feature = "parallel"))]
    {
        out.chunks_mut(stride)
            .enumerate()
            .for_each(|(e, chunk)| f(e, chunk));
    }
}
