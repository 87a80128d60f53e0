//! Boundary conditions for domain-boundary interfaces.
//!
//! A boundary condition supplies the "ghost" state outside the domain, and
//! the common flux at a boundary face point is F*(u, ghost; n) with the
//! same Riemann solver as interior faces.
//!
//! Evaluation is split in two steps:
//! 1. [`BoundaryCondition::prepare`] fills an external-state buffer once per
//!    residual evaluation (time-dependent data lives here)
//! 2. [`BoundaryCondition::ghost_state`] combines the interior state with
//!    the prepared external state at every flux evaluation
//!
//! | BC Type | Description |
//! |---------|-------------|
//! | `FixedState` | Constant Dirichlet state |
//! | `PrescribedState` | Dirichlet state from a function of (x, y, t) |
//! | `Extrapolate` | Zero-gradient outflow |
//! | `SlipWall` | Inviscid wall, normal momentum reflected |

mod conditions;

pub use conditions::{Extrapolate, FixedState, PrescribedState, SlipWall, StateFn};

use std::fmt::Debug;

/// Context for a ghost-state evaluation at one boundary face point.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryContext<'a> {
    /// Simulation time
    pub time: f64,
    /// Physical position of the face point
    pub position: (f64, f64),
    /// Interior state extrapolated to the face point
    pub interior: &'a [f64],
    /// External state written by `prepare`
    pub external: &'a [f64],
    /// Outward unit normal
    pub normal: (f64, f64),
}

/// Ghost-state provider for one boundary tag.
///
/// Implementations must be thread-safe (`Send + Sync`) since kernels share
/// them through an `Arc`.
pub trait BoundaryCondition: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Write the external state at a face point for time `time`.
    ///
    /// The default leaves the buffer untouched, for conditions that only
    /// depend on the interior state.
    fn prepare(&self, _position: (f64, f64), _time: f64, _external: &mut [f64]) {}

    /// Ghost state used as the right state of the common flux.
    fn ghost_state(&self, ctx: &BoundaryContext<'_>, ghost: &mut [f64]);
}
