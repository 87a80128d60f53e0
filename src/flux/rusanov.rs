//! Rusanov (local Lax-Friedrichs) and central fluxes.
//!
//! F* = ½(F(u_l) + F(u_r))·n - ½ λ_max (u_r - u_l)
//!
//! with λ_max = max(|λ(u_l)|, |λ(u_r)|) along n.

use crate::equations::{FluxModel, MAX_VARS};

/// Rusanov flux along the unit normal `n`, written into `out`.
pub fn rusanov_flux(
    model: &dyn FluxModel,
    u_l: &[f64],
    u_r: &[f64],
    n: (f64, f64),
    out: &mut [f64],
) {
    let nv = model.n_vars();
    let mut f_l = [0.0; MAX_VARS];
    let mut f_r = [0.0; MAX_VARS];
    model.normal_flux(u_l, n, &mut f_l[..nv]);
    model.normal_flux(u_r, n, &mut f_r[..nv]);

    let lambda = model.max_wave_speed(u_l, n).max(model.max_wave_speed(u_r, n));
    for v in 0..nv {
        out[v] = 0.5 * (f_l[v] + f_r[v]) - 0.5 * lambda * (u_r[v] - u_l[v]);
    }
}

/// Arithmetic mean of the two normal fluxes (no dissipation).
pub fn central_flux(
    model: &dyn FluxModel,
    u_l: &[f64],
    u_r: &[f64],
    n: (f64, f64),
    out: &mut [f64],
) {
    let nv = model.n_vars();
    let mut f_l = [0.0; MAX_VARS];
    let mut f_r = [0.0; MAX_VARS];
    model.normal_flux(u_l, n, &mut f_l[..nv]);
    model.normal_flux(u_r, n, &mut f_r[..nv]);
    for v in 0..nv {
        out[v] = 0.5 * (f_l[v] + f_r[v]);
    }
}
