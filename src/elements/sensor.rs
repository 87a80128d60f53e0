//! Shock sensor and face-point limiter.
//!
//! The sensor compares the low-order divergence with its centered
//! counterpart. Their difference is the dissipation the upwind subcell
//! fluxes add; relative to the size of the divergence it is small where the
//! solution is smooth and O(1) across discontinuities.

use super::extrapolate::FaceSubset;
use super::{ElementContext, check_len};
use crate::backend::{Binding, Kernel, KernelError, KernelMemory, LaunchArgs, Progress};
use crate::equations::MAX_VARS;
use std::sync::Arc;
use tracing::debug;

/// Tolerance guarding the sensor and limiter denominators.
pub const SENSOR_TOL: f64 = 1e-8;

/// Stores the shock variable of `divf_lo` in the residual field.
pub struct Residual {
    ctx: Arc<ElementContext>,
    divf_lo: Binding,
    residual: Binding,
}

impl Residual {
    pub fn new(ctx: &Arc<ElementContext>, divf_lo: Binding, residual: Binding) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            divf_lo,
            residual,
        }
    }
}

impl Kernel for Residual {
    fn name(&self) -> &str {
        "residual"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let nv = ctx.nvars;
        let sv = ctx.model.shock_variable();
        let npts = ctx.neles * ctx.points.n_upts();
        mem.with_output(self.residual, |res, inputs| {
            let div = inputs.read(self.divf_lo)?;
            check_len("divf_lo", div, npts * nv)?;
            check_len("residual", res, npts)?;
            for (r, d) in res.iter_mut().zip(div.chunks_exact(nv)) {
                *r = d[sv];
            }
            Ok(Progress::Done)
        })
    }
}

/// Smooths the residual and turns it into the blend coefficient α.
///
/// Per element, with d = residual - divf_centered[sv] and d̃ = M d:
///
/// e = sqrt(Σ w d̃²) / (sqrt(Σ w (|residual| + |divf_centered[sv]|)²) + tol)
///
/// α = clamp(e / e_max, 0, 1), or the fixed coefficient when one is set.
/// The residual field is replaced by d̃.
pub struct NormalizeResidual {
    ctx: Arc<ElementContext>,
    e_max: f64,
    fixed_alpha: Option<f64>,
    divf_centered: Binding,
    residual: Binding,
    alpha: Binding,
}

impl NormalizeResidual {
    pub fn new(
        ctx: &Arc<ElementContext>,
        e_max: f64,
        fixed_alpha: Option<f64>,
        divf_centered: Binding,
        residual: Binding,
        alpha: Binding,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            e_max,
            fixed_alpha,
            divf_centered,
            residual,
            alpha,
        }
    }

    /// Smooth one element's residual in place and return its sensor value.
    fn element(&self, res: &mut [f64], divc: &[f64], scratch: &mut [f64]) -> f64 {
        let ctx = &*self.ctx;
        let nu = ctx.points.n_upts();
        let nv = ctx.nvars;
        let sv = ctx.model.shock_variable();
        let smooth = &ctx.ops.smoothing_row_major;
        let w = &ctx.ops.weights;

        for k in 0..nu {
            scratch[k] = res[k] - divc[k * nv + sv];
        }

        let (mut num, mut den) = (0.0, 0.0);
        for a in 0..nu {
            let row = &smooth[a * nu..(a + 1) * nu];
            let d: f64 = row.iter().zip(&scratch[..nu]).map(|(m, d)| m * d).sum();
            let size = res[a].abs() + divc[a * nv + sv].abs();
            num += w[a] * d * d;
            den += w[a] * size * size;
            scratch[nu + a] = d;
        }
        res.copy_from_slice(&scratch[nu..2 * nu]);

        num.sqrt() / (den.sqrt() + SENSOR_TOL)
    }
}

impl Kernel for NormalizeResidual {
    fn name(&self) -> &str {
        "normalizeresidual"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let nu = ctx.points.n_upts();
        let us = ctx.upts_stride();
        mem.with_outputs([self.residual, self.alpha], |[res, alpha], inputs| {
            let divc = inputs.read(self.divf_centered)?;
            check_len("divf_centered", divc, ctx.neles * us)?;
            check_len("residual", res, ctx.neles * nu)?;
            check_len("alpha", alpha, ctx.neles)?;

            let mut scratch = vec![0.0; 2 * nu];
            let mut flagged = 0usize;
            for e in 0..ctx.neles {
                let sensor = self.element(
                    &mut res[e * nu..(e + 1) * nu],
                    &divc[e * us..(e + 1) * us],
                    &mut scratch,
                );
                let a = self
                    .fixed_alpha
                    .unwrap_or_else(|| (sensor / self.e_max).clamp(0.0, 1.0));
                if a >= 1.0 {
                    flagged += 1;
                }
                alpha[e] = a;
            }
            if flagged > 0 {
                debug!(flagged, neles = ctx.neles, "sensor saturated");
            }
            Ok(Progress::Done)
        })
    }
}

/// Replaces high-order face values that stray too far from the low-order ones.
///
/// For each face point the deviation max_v |u_HO - u_LO| / (s_v + tol),
/// with u_LO the nearest solution point and s_v = max_k |u_k,v| over the
/// element's solution points, is compared with `e_max`; above it the face
/// value falls back to u_LO. Runs after the matching HO extrapolation, on
/// the same face subset.
pub struct LimitInterp {
    name: &'static str,
    ctx: Arc<ElementContext>,
    subset: FaceSubset,
    e_max: f64,
    u: Binding,
    fpts: Binding,
}

impl LimitInterp {
    pub fn new(
        name: &'static str,
        ctx: &Arc<ElementContext>,
        subset: FaceSubset,
        e_max: f64,
        u: Binding,
        fpts: Binding,
    ) -> Self {
        Self {
            name,
            ctx: Arc::clone(ctx),
            subset,
            e_max,
            u,
            fpts,
        }
    }

    fn element(&self, e: usize, u: &[f64], fpts: &mut [f64]) -> usize {
        let ctx = &*self.ctx;
        let nv = ctx.nvars;
        let mut scale = [0.0_f64; MAX_VARS];
        for point in u.chunks_exact(nv) {
            for (s, v) in scale.iter_mut().zip(point) {
                *s = s.max(v.abs());
            }
        }
        let mut limited = 0;
        for face in 0..4 {
            if !self.subset.contains(ctx.ext_faces[e][face]) {
                continue;
            }
            for m in 0..ctx.points.n_1d {
                let f = ctx.points.fpt(face, m) * nv;
                let k = ctx.points.nearest_upt(face, m) * nv;
                let lo = &u[k..k + nv];
                let ho = &mut fpts[f..f + nv];
                let dev = ho
                    .iter()
                    .zip(lo)
                    .zip(&scale)
                    .map(|((h, l), s)| (h - l).abs() / (s + SENSOR_TOL))
                    .fold(0.0, f64::max);
                if dev > self.e_max {
                    ho.copy_from_slice(lo);
                    limited += 1;
                }
            }
        }
        limited
    }
}

impl Kernel for LimitInterp {
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
            let limited: usize = fpts
                .chunks_mut(fs)
                .enumerate()
                .map(|(e, f)| self.element(e, &u[e * us..(e + 1) * us], f))
                .sum();
            if limited > 0 {
                debug!(kernel = self.name, limited, "face points limited");
            }
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

    #[test]
    fn test_residual_picks_shock_variable() {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 1, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let b = set.buffers;
        pool.bank_mut(b.divf_lo, 0)
            .unwrap()
            .copy_from_slice(&[0.5, -1.0, 2.0, 0.0]);
        let mut mem = pool.memory(ActiveBanks::default());
        Residual::new(&set.ctx, b.divf_lo.plain(), b.residual.plain())
            .run(&mut mem, &LaunchArgs::default())
            .unwrap();
        assert_eq!(mem.read(b.residual.plain()).unwrap(), &[0.5, -1.0, 2.0, 0.0]);
    }

    fn normalize(residual: &[f64], centered: &[f64], fixed: Option<f64>) -> (Vec<f64>, f64) {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 1, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let b = set.buffers;
        pool.bank_mut(b.residual, 0).unwrap().copy_from_slice(residual);
        pool.bank_mut(b.divf_centered, 0).unwrap().copy_from_slice(centered);
        let mut mem = pool.memory(ActiveBanks::default());
        NormalizeResidual::new(
            &set.ctx,
            0.5,
            fixed,
            b.divf_centered.plain(),
            b.residual.plain(),
            b.alpha.plain(),
        )
        .run(&mut mem, &LaunchArgs::default())
        .unwrap();
        (
            mem.read(b.residual.plain()).unwrap().to_vec(),
            mem.read(b.alpha.plain()).unwrap()[0],
        )
    }

    #[test]
    fn test_matching_operators_give_zero_alpha() {
        let r = [1.0, -2.0, 0.5, 3.0];
        let (smoothed, alpha) = normalize(&r, &r, None);
        assert!(smoothed.iter().all(|d| d.abs() < 1e-14));
        assert!(alpha.abs() < 1e-14);
    }

    #[test]
    fn test_large_dissipation_saturates_alpha() {
        let (smoothed, alpha) = normalize(&[1.0; 4], &[0.0; 4], None);
        // Uniform d is a fixed point of the smoothing
        assert!(smoothed.iter().all(|d| (d - 1.0).abs() < 1e-12));
        // e ≈ 1 > e_max = 0.5
        assert_eq!(alpha, 1.0);
    }

    #[test]
    fn test_alpha_is_clamped_ratio() {
        // d = 0.2 everywhere, |r| + |c| = 1.2 + 1.0: e = 0.2 / 2.2
        let (_, alpha) = normalize(&[1.2; 4], &[1.0; 4], None);
        let e = 0.2 * 2.0 / (2.2 * 2.0 + SENSOR_TOL);
        assert!((alpha - e / 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_alpha_overrides_sensor() {
        let (smoothed, alpha) = normalize(&[1.0; 4], &[0.0; 4], Some(0.25));
        assert_eq!(alpha, 0.25);
        assert!(smoothed.iter().all(|d| (d - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_limiter_falls_back_to_low_order() {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 1, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let b = set.buffers;
        let ctx = Arc::clone(&set.ctx);
        set.set_solution(&mut pool, 0, |_, _, u| u[0] = 1.0).unwrap();
        let fpts = pool.bank_mut(b.scal_fpts, 0).unwrap();
        fpts.fill(1.1);
        fpts[ctx.points.fpt(2, 1)] = 5.0;

        let mut mem = pool.memory(ActiveBanks::default());
        LimitInterp::new(
            "limitinterp_int",
            &ctx,
            FaceSubset::Local,
            0.5,
            b.scal_upts.input(),
            b.scal_fpts.plain(),
        )
        .run(&mut mem, &LaunchArgs::default())
        .unwrap();

        let fpts = mem.read(b.scal_fpts.plain()).unwrap();
        assert_eq!(fpts[ctx.points.fpt(2, 1)], 1.0);
        // Within tolerance: kept
        assert_eq!(fpts[ctx.points.fpt(0, 0)], 1.1);
    }

    #[test]
    fn test_limiter_scale_is_per_element() {
        // u = x - 1 crosses zero at the element centre
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(2, 1, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let b = set.buffers;
        let ctx = Arc::clone(&set.ctx);
        set.set_solution(&mut pool, 0, |x, _, u| u[0] = x - 1.0).unwrap();
        let u = pool.bank(b.scal_upts, 0).unwrap().to_vec();

        let fpts = pool.bank_mut(b.scal_fpts, 0).unwrap();
        for face in 0..4 {
            for m in 0..ctx.points.n_1d {
                fpts[ctx.points.fpt(face, m)] = u[ctx.points.nearest_upt(face, m)];
            }
        }
        let (small, large) = (ctx.points.fpt(0, 1), ctx.points.fpt(2, 1));
        assert!(u[ctx.points.nearest_upt(0, 1)].abs() < 1e-12);
        fpts[small] += 0.05;
        fpts[large] += 1.0;

        let mut mem = pool.memory(ActiveBanks::default());
        LimitInterp::new(
            "limitinterp_int",
            &ctx,
            FaceSubset::Local,
            0.5,
            b.scal_upts.input(),
            b.scal_fpts.plain(),
        )
        .run(&mut mem, &LaunchArgs::default())
        .unwrap();

        let fpts = mem.read(b.scal_fpts.plain()).unwrap();
        // 0.05 against max |u| ≈ 0.77: kept even though u_LO = 0
        assert!((fpts[small] - 0.05).abs() < 1e-12);
        // 1.0 against 0.77: limited
        assert!(fpts[large].abs() < 1e-12);
    }
}
