//! HLL (Harten-Lax-van Leer) approximate Riemann solver.
//!
//! F* = (s_r F_l - s_l F_r + s_l s_r (u_r - u_l)) / (s_r - s_l)
//!
//! where s_l and s_r bound the fastest left- and right-going waves.
//! Wave speeds use the Davis estimates
//! s_l = min(λ_min(u_l), λ_min(u_r)), s_r = max(λ_max(u_l), λ_max(u_r)).
//!
//! Reference: Toro, "Riemann Solvers and Numerical Methods for Fluid Dynamics"

use crate::equations::{FluxModel, MAX_VARS};

/// HLL flux along the unit normal `n`, written into `out`.
pub fn hll_flux(
    model: &dyn FluxModel,
    u_l: &[f64],
    u_r: &[f64],
    n: (f64, f64),
    out: &mut [f64],
) {
    let nv = model.n_vars();
    let (l_min, l_max) = model.wave_speeds(u_l, n);
    let (r_min, r_max) = model.wave_speeds(u_r, n);
    let s_l = l_min.min(r_min);
    let s_r = l_max.max(r_max);

    if s_l >= 0.0 {
        model.normal_flux(u_l, n, &mut out[..nv]);
        return;
    }
    if s_r <= 0.0 {
        model.normal_flux(u_r, n, &mut out[..nv]);
        return;
    }

    let mut f_l = [0.0; MAX_VARS];
    let mut f_r = [0.0; MAX_VARS];
    model.normal_flux(u_l, n, &mut f_l[..nv]);
    model.normal_flux(u_r, n, &mut f_r[..nv]);

    let inv_ds = 1.0 / (s_r - s_l);
    for v in 0..nv {
        out[v] = inv_ds * (s_r * f_l[v] - s_l * f_r[v] + s_l * s_r * (u_r[v] - u_l[v]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::Euler2D;

    #[test]
    fn test_consistency() {
        let eq = Euler2D::new(1.4);
        let u = eq.conserved(1.1, 0.3, -0.2, 0.9);
        let n = (0.6, 0.8);
        let (mut star, mut exact) = ([0.0; 4], [0.0; 4]);
        hll_flux(&eq, &u, &u, n, &mut star);
        eq.normal_flux(&u, n, &mut exact);
        for v in 0..4 {
            assert!((star[v] - exact[v]).abs() < 1e-13, "var {}", v);
        }
    }

    #[test]
    fn test_supersonic_upwinding() {
        let eq = Euler2D::new(1.4);
        let u_l = eq.conserved(1.0, 5.0, 0.0, 1.0);
        let u_r = eq.conserved(0.5, 5.0, 0.0, 0.5);
        let (mut star, mut f_l) = ([0.0; 4], [0.0; 4]);
        hll_flux(&eq, &u_l, &u_r, (1.0, 0.0), &mut star);
        eq.normal_flux(&u_l, (1.0, 0.0), &mut f_l);
        for v in 0..4 {
            assert!((star[v] - f_l[v]).abs() < 1e-13);
        }
    }

    #[test]
    fn test_antisymmetry_under_side_swap() {
        let eq = Euler2D::new(1.4);
        let a = eq.conserved(1.0, 0.2, 0.1, 1.0);
        let b = eq.conserved(0.4, -0.1, 0.3, 0.3);
        let (mut ab, mut ba) = ([0.0; 4], [0.0; 4]);
        hll_flux(&eq, &a, &b, (0.0, 1.0), &mut ab);
        hll_flux(&eq, &b, &a, (0.0, -1.0), &mut ba);
        for v in 0..4 {
            assert!((ab[v] + ba[v]).abs() < 1e-13);
        }
    }
}
