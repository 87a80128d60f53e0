//! Flux models for 2D conservation laws.
//!
//! ∂u/∂t + ∇·F(u) = S(u, x, t)
//!
//! Kernels only ever need the flux projected on a direction, so the trait
//! exposes `normal_flux(u, d) = d_x F_x(u) + d_y F_y(u)` for an arbitrary
//! (not necessarily unit) direction `d`. With `d = ∇ξ` this is the
//! contravariant flux used by the element kernels.

mod advection_2d;
mod euler_2d;

pub use advection_2d::Advection2D;
pub use euler_2d::Euler2D;

use std::fmt::Debug;

/// Upper bound on the number of conserved variables a model may declare.
///
/// Kernels keep per-point scratch states on the stack.
pub const MAX_VARS: usize = 8;

/// A hyperbolic flux model.
///
/// Implementations must be thread-safe (`Send + Sync`): kernels share the
/// model through an `Arc` and may fan out over elements.
pub trait FluxModel: Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Number of conserved variables.
    fn n_vars(&self) -> usize;

    /// Flux projected on `dir`: out = dir.0 F_x(u) + dir.1 F_y(u).
    fn normal_flux(&self, u: &[f64], dir: (f64, f64), out: &mut [f64]);

    /// Smallest and largest characteristic speed along the unit normal `n`.
    fn wave_speeds(&self, u: &[f64], n: (f64, f64)) -> (f64, f64);

    /// Largest absolute characteristic speed along the unit normal `n`.
    fn max_wave_speed(&self, u: &[f64], n: (f64, f64)) -> f64 {
        let (lo, hi) = self.wave_speeds(u, n);
        lo.abs().max(hi.abs())
    }

    /// Variable whose residual drives the shock sensor.
    fn shock_variable(&self) -> usize {
        0
    }

    /// Indices of the momentum components, for models that have them.
    fn momentum(&self) -> Option<(usize, usize)> {
        None
    }
}
