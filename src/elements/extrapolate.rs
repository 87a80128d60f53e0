//! Solution extrapolation to face points.

use super::{ElementContext, check_len, for_each_element};
use crate::backend::{Binding, Kernel, KernelError, KernelMemory, LaunchArgs, Progress};
use std::sync::Arc;

/// Face reconstruction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconstruction {
    /// Value of the solution point nearest to the face point
    Low,
    /// Polynomial extrapolation with the end rows of the interpolation matrix
    High,
}

/// Which face points a kernel covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceSubset {
    /// Faces on a partition boundary, whose values are sent to a neighbour
    Partition,
    /// Every other face
    Local,
}

impl FaceSubset {
    #[inline]
    pub fn contains(self, on_partition_boundary: bool) -> bool {
        match self {
            FaceSubset::Partition => on_partition_boundary,
            FaceSubset::Local => !on_partition_boundary,
        }
    }
}

/// Writes extrapolated solution values into `scal_fpts`.
///
/// Only the face points of the selected subset are written; the rest of the
/// buffer is left as it is.
pub struct Extrapolate {
    name: &'static str,
    ctx: Arc<ElementContext>,
    recon: Reconstruction,
    subset: FaceSubset,
    u: Binding,
    fpts: Binding,
}

impl Extrapolate {
    pub fn new(
        name: &'static str,
        ctx: &Arc<ElementContext>,
        recon: Reconstruction,
        subset: FaceSubset,
        u: Binding,
        fpts: Binding,
    ) -> Self {
        Self {
            name,
            ctx: Arc::clone(ctx),
            recon,
            subset,
            u,
            fpts,
        }
    }

    fn element(&self, e: usize, u: &[f64], fpts: &mut [f64]) {
        let ctx = &*self.ctx;
        let pts = ctx.points;
        let nv = ctx.nvars;
        let n = pts.n_1d;
        let p = n - 1;
        let interp = &ctx.ops.interp_row_major;

        for face in 0..4 {
            if !self.subset.contains(ctx.ext_faces[e][face]) {
                continue;
            }
            for m in 0..n {
                let f = pts.fpt(face, m) * nv;
                match self.recon {
                    Reconstruction::Low => {
                        let k = pts.nearest_upt(face, m) * nv;
                        fpts[f..f + nv].copy_from_slice(&u[k..k + nv]);
                    }
                    Reconstruction::High => {
                        let end = pts.line_end(face, m);
                        let row = if end.high { p + 1 } else { 0 };
                        let weights = &interp[row * n..(row + 1) * n];
                        let dst = &mut fpts[f..f + nv];
                        dst.fill(0.0);
                        for (k, &w) in weights.iter().enumerate() {
                            let s = pts.upt_on_line(end.dir, end.line, k) * nv;
                            for v in 0..nv {
                                dst[v] += w * u[s + v];
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Kernel for Extrapolate {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let (us, fs) = (ctx.upts_stride(), ctx.fpts_stride());
        mem.with_output(self.fpts, |fpts, inputs| {
            let u = inputs.read(self.u)?;
            check_len("scal_upts", u, ctx.neles * us)?;
            check_len("scal_fpts", fpts, ctx.neles * fs)?;
            for_each_element(fpts, fs, |e, f| self.element(e, &u[e * us..(e + 1) * us], f));
            Ok(Progress::Done)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActiveBanks, BufferPool};
    use crate::elements::test_support::periodic_set;
    use crate::equations::Advection2D;

    type Extrapolated = (Vec<f64>, Vec<f64>, Arc<ElementContext>, [(f64, f64); 4]);

    fn extrapolate_linear(recon: Reconstruction) -> Extrapolated {
        let mut pool = BufferPool::new();
        let (part, set) = periodic_set(2, 2, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        set.set_solution(&mut pool, 0, |x, y, u| u[0] = 1.0 + 2.0 * x - y)
            .unwrap();
        let b = set.buffers;
        let k = Extrapolate::new(
            "disu",
            &set.ctx,
            recon,
            FaceSubset::Local,
            b.scal_upts.input(),
            b.scal_fpts.plain(),
        );
        let mut mem = pool.memory(ActiveBanks::new(0, 1));
        k.run(&mut mem, &LaunchArgs::default()).unwrap();
        (
            mem.read(b.scal_upts.input()).unwrap().to_vec(),
            mem.read(b.scal_fpts.plain()).unwrap().to_vec(),
            Arc::clone(&set.ctx),
            part.element_vertices[0],
        )
    }

    #[test]
    fn test_high_order_is_exact_for_linear_data() {
        let (_, fpts, ctx, verts) = extrapolate_linear(Reconstruction::High);
        for face in 0..4 {
            for m in 0..ctx.points.n_1d {
                let (x, y) = ctx.face_point_location(&verts, face, m);
                let got = fpts[ctx.points.fpt(face, m)];
                assert!((got - (1.0 + 2.0 * x - y)).abs() < 1e-12, "face {face} m {m}");
            }
        }
    }

    #[test]
    fn test_low_order_copies_nearest_point() {
        let (u, fpts, ctx, _) = extrapolate_linear(Reconstruction::Low);
        for face in 0..4 {
            for m in 0..ctx.points.n_1d {
                let k = ctx.points.nearest_upt(face, m);
                assert_eq!(fpts[ctx.points.fpt(face, m)], u[k]);
            }
        }
    }

    #[test]
    fn test_partition_subset_leaves_local_faces() {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 2, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        set.set_solution(&mut pool, 0, |_, _, u| u[0] = 3.0).unwrap();
        pool.bank_mut(set.buffers.scal_fpts, 0).unwrap().fill(-1.0);
        let k = Extrapolate::new(
            "disu",
            &set.ctx,
            Reconstruction::Low,
            FaceSubset::Partition,
            set.buffers.scal_upts.input(),
            set.buffers.scal_fpts.plain(),
        );
        let mut mem = pool.memory(ActiveBanks::default());
        k.run(&mut mem, &LaunchArgs::default()).unwrap();
        // A single partition has no partition-boundary faces
        assert!(mem.read(set.buffers.scal_fpts.plain()).unwrap().iter().all(|&v| v == -1.0));
    }
}
