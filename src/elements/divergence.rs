//! Flux-divergence kernels: subcell (low-order), residual distribution
//! (high-order) and the interface corrections shared by both.
//!
//! Every kernel visits the p+1 lines of each reference direction. Along a
//! line, G_m is the contravariant flux at extended point m (m = 0..=p+1);
//! the divergence at solution point i is Σ_m A[i, m] G_m with A either the
//! subcell matrix Δ or the RD matrix D. Interior points m = 1..=p are
//! element-local; the end points m = 0 and m = p+1 come from the common
//! flux in the face buffer and are added by [`InterfaceCorrection`].

use super::{ElementContext, check_len, for_each_element};
use crate::backend::{Binding, Kernel, KernelError, KernelMemory, LaunchArgs, Progress};
use crate::equations::MAX_VARS;
use crate::flux::FaceFlux;
use crate::operators::LineDir;
use std::sync::Arc;

const DIRECTIONS: [LineDir; 2] = [LineDir::Xi, LineDir::Eta];

/// Accumulate Σ_{m=1..=p} A[i, m] G_m into the points of one line.
///
/// `g` holds G_1..G_p for every variable: `g[(m - 1) * nv + v]`.
#[inline]
fn distribute_interior(
    ctx: &ElementContext,
    matrix: &[f64],
    dir: LineDir,
    line: usize,
    g: &[f64],
    out: &mut [f64],
) {
    let nv = ctx.nvars;
    let n = ctx.points.n_1d;
    let n_ext = n + 1;
    for i in 0..n {
        let dst = ctx.points.upt_on_line(dir, line, i) * nv;
        let row = &matrix[i * n_ext..(i + 1) * n_ext];
        for m in 1..n {
            let a = row[m];
            if a == 0.0 {
                continue;
            }
            for v in 0..nv {
                out[dst + v] += a * g[(m - 1) * nv + v];
            }
        }
    }
}

/// Low-order divergence from Riemann fluxes at the interior subcell faces.
///
/// G_m = |∇ξ| F*(u_{m-1}, u_m; ∇ξ/|∇ξ|) for m = 1..=p, with the element's
/// upwind solver (`divf_lo`) or the central average (`divf_centered`).
/// The output is overwritten.
pub struct SubcellDivergence {
    name: &'static str,
    ctx: Arc<ElementContext>,
    flux: FaceFlux,
    u: Binding,
    out: Binding,
}

impl SubcellDivergence {
    pub fn new(
        name: &'static str,
        ctx: &Arc<ElementContext>,
        flux: FaceFlux,
        u: Binding,
        out: Binding,
    ) -> Self {
        Self {
            name,
            ctx: Arc::clone(ctx),
            flux,
            u,
            out,
        }
    }

    fn element(&self, e: usize, u: &[f64], out: &mut [f64]) {
        let ctx = &*self.ctx;
        let nv = ctx.nvars;
        let n = ctx.points.n_1d;
        let metrics = &ctx.metrics[e];
        let mut g = vec![0.0; (n - 1) * nv];
        let mut f = [0.0; MAX_VARS];

        out.fill(0.0);
        for dir in DIRECTIONS {
            let (gx, gy) = metrics.grad(dir);
            let scale = metrics.grad_norm(dir);
            let normal = (gx / scale, gy / scale);

            for line in 0..n {
                for m in 1..n {
                    let l = ctx.points.upt_on_line(dir, line, m - 1) * nv;
                    let r = ctx.points.upt_on_line(dir, line, m) * nv;
                    self.flux.flux(
                        ctx.model.as_ref(),
                        &u[l..l + nv],
                        &u[r..r + nv],
                        normal,
                        &mut f[..nv],
                    );
                    for v in 0..nv {
                        g[(m - 1) * nv + v] = scale * f[v];
                    }
                }
                distribute_interior(ctx, &ctx.ops.diff_subcell_row_major, dir, line, &g, out);
            }
        }
    }
}

impl Kernel for SubcellDivergence {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let us = ctx.upts_stride();
        mem.with_output(self.out, |out, inputs| {
            let u = inputs.read(self.u)?;
            check_len("scal_upts", u, ctx.neles * us)?;
            check_len(self.name, out, ctx.neles * us)?;
            for_each_element(out, us, |e, o| self.element(e, &u[e * us..(e + 1) * us], o));
            Ok(Progress::Done)
        })
    }
}

/// High-order divergence at the interior extended points.
///
/// u_m = Σ_i I[m, i] u_i and G_m = ∇ξ·F(u_m) for m = 1..=p; the output
/// (`divf_rd`) is overwritten and still lacks the interface terms.
pub struct RiemannDifference {
    ctx: Arc<ElementContext>,
    u: Binding,
    out: Binding,
}

impl RiemannDifference {
    pub fn new(ctx: &Arc<ElementContext>, u: Binding, out: Binding) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            u,
            out,
        }
    }

    fn element(&self, e: usize, u: &[f64], out: &mut [f64]) {
        let ctx = &*self.ctx;
        let nv = ctx.nvars;
        let n = ctx.points.n_1d;
        let interp = &ctx.ops.interp_row_major;
        let metrics = &ctx.metrics[e];
        let mut g = vec![0.0; (n - 1) * nv];
        let mut um = [0.0; MAX_VARS];

        out.fill(0.0);
        for dir in DIRECTIONS {
            let grad = metrics.grad(dir);
            for line in 0..n {
                for m in 1..n {
                    let row = &interp[m * n..(m + 1) * n];
                    um[..nv].fill(0.0);
                    for (k, &w) in row.iter().enumerate() {
                        let s = ctx.points.upt_on_line(dir, line, k) * nv;
                        for v in 0..nv {
                            um[v] += w * u[s + v];
                        }
                    }
                    ctx.model
                        .normal_flux(&um[..nv], grad, &mut g[(m - 1) * nv..m * nv]);
                }
                distribute_interior(ctx, &ctx.ops.diff_rd_row_major, dir, line, &g, out);
            }
        }
    }
}

impl Kernel for RiemannDifference {
    fn name(&self) -> &str {
        "riemanndifference"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let us = ctx.upts_stride();
        mem.with_output(self.out, |out, inputs| {
            let u = inputs.read(self.u)?;
            check_len("scal_upts", u, ctx.neles * us)?;
            check_len("divf_rd", out, ctx.neles * us)?;
            for_each_element(out, us, |e, o| self.element(e, &u[e * us..(e + 1) * us], o));
            Ok(Progress::Done)
        })
    }
}

/// Differentiation matrix used for the interface terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Correction {
    /// Subcell difference Δ, for the low-order and centered operators
    Subcell,
    /// RD differentiation D
    ResidualDistribution,
}

/// Adds the interface terms A[i, 0] G_0 + A[i, p+1] G_{p+1} in place.
///
/// The face buffer holds the common outward normal flux per unit length,
/// so G_0 = -|∇ξ| F*_n at the low end and G_{p+1} = |∇ξ| F*_n at the high
/// end of every line.
pub struct InterfaceCorrection {
    name: &'static str,
    ctx: Arc<ElementContext>,
    correction: Correction,
    fpts: Binding,
    out: Binding,
}

impl InterfaceCorrection {
    pub fn new(
        name: &'static str,
        ctx: &Arc<ElementContext>,
        correction: Correction,
        fpts: Binding,
        out: Binding,
    ) -> Self {
        Self {
            name,
            ctx: Arc::clone(ctx),
            correction,
            fpts,
            out,
        }
    }

    fn element(&self, e: usize, fpts: &[f64], out: &mut [f64]) {
        let ctx = &*self.ctx;
        let nv = ctx.nvars;
        let n = ctx.points.n_1d;
        let n_ext = n + 1;
        let matrix = match self.correction {
            Correction::Subcell => &ctx.ops.diff_subcell_row_major,
            Correction::ResidualDistribution => &ctx.ops.diff_rd_row_major,
        };
        let metrics = &ctx.metrics[e];

        for dir in DIRECTIONS {
            let scale = metrics.grad_norm(dir);
            for line in 0..n {
                let (lo, hi) = ctx.points.line_ends(dir, line);
                let (lo, hi) = (lo * nv, hi * nv);
                for i in 0..n {
                    let dst = ctx.points.upt_on_line(dir, line, i) * nv;
                    let a0 = matrix[i * n_ext];
                    let a1 = matrix[i * n_ext + n];
                    for v in 0..nv {
                        out[dst + v] += scale * (a1 * fpts[hi + v] - a0 * fpts[lo + v]);
                    }
                }
            }
        }
    }
}

impl Kernel for InterfaceCorrection {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let (us, fs) = (ctx.upts_stride(), ctx.fpts_stride());
        mem.with_output(self.out, |out, inputs| {
            let fpts = inputs.read(self.fpts)?;
            check_len("scal_fpts", fpts, ctx.neles * fs)?;
            check_len(self.name, out, ctx.neles * us)?;
            for_each_element(out, us, |e, o| self.element(e, &fpts[e * fs..(e + 1) * fs], o));
            Ok(Progress::Done)
        })
    }
}
