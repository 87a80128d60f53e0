//! Boundary condition implementations.

use super::{BoundaryCondition, BoundaryContext};
use crate::equations::FluxModel;
use std::fmt;

/// Dirichlet condition with a constant external state.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedState {
    pub state: Vec<f64>,
}

impl FixedState {
    pub fn new(state: impl Into<Vec<f64>>) -> Self {
        Self {
            state: state.into(),
        }
    }
}

impl BoundaryCondition for FixedState {
    fn name(&self) -> &'static str {
        "fixed_state"
    }

    fn prepare(&self, _position: (f64, f64), _time: f64, external: &mut [f64]) {
        for (e, s) in external.iter_mut().zip(&self.state) {
            *e = *s;
        }
    }

    fn ghost_state(&self, ctx: &BoundaryContext<'_>, ghost: &mut [f64]) {
        ghost.copy_from_slice(ctx.external);
    }
}

/// Function type of a prescribed external state: (x, y, t, out).
pub type StateFn = Box<dyn Fn(f64, f64, f64, &mut [f64]) + Send + Sync>;

/// Dirichlet condition with an external state that varies in space and time.
///
/// The state is evaluated once per residual evaluation, when the boundary
/// interfaces are prepared.
pub struct PrescribedState {
    state: StateFn,
}

impl PrescribedState {
    pub fn new(state: impl Fn(f64, f64, f64, &mut [f64]) + Send + Sync + 'static) -> Self {
        Self {
            state: Box::new(state),
        }
    }
}

impl fmt::Debug for PrescribedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrescribedState").finish_non_exhaustive()
    }
}

impl BoundaryCondition for PrescribedState {
    fn name(&self) -> &'static str {
        "prescribed_state"
    }

    fn prepare(&self, position: (f64, f64), time: f64, external: &mut [f64]) {
        (self.state)(position.0, position.1, time, external);
    }

    fn ghost_state(&self, ctx: &BoundaryContext<'_>, ghost: &mut [f64]) {
        ghost.copy_from_slice(ctx.external);
    }
}

/// Zero-gradient outflow: the ghost state copies the interior state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Extrapolate;

impl BoundaryCondition for Extrapolate {
    fn name(&self) -> &'static str {
        "extrapolate"
    }

    fn ghost_state(&self, ctx: &BoundaryContext<'_>, ghost: &mut [f64]) {
        ghost.copy_from_slice(ctx.interior);
    }
}

/// Inviscid wall: mirror state with the normal momentum reversed.
///
/// For outward normal n the ghost momentum is m - 2(m·n)n, every other
/// variable is copied. The common flux then carries no mass through the
/// wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlipWall {
    /// Indices of the x and y momentum components
    pub momentum: (usize, usize),
}

impl SlipWall {
    pub fn new(momentum: (usize, usize)) -> Self {
        Self { momentum }
    }

    /// Slip wall for a model with momentum components, if it has any.
    pub fn for_model(model: &dyn FluxModel) -> Option<Self> {
        model.momentum().map(Self::new)
    }
}

impl BoundaryCondition for SlipWall {
    fn name(&self) -> &'static str {
        "slip_wall"
    }

    fn ghost_state(&self, ctx: &BoundaryContext<'_>, ghost: &mut [f64]) {
        ghost.copy_from_slice(ctx.interior);
        let (ix, iy) = self.momentum;
        let (nx, ny) = ctx.normal;
        let mn = ctx.interior[ix] * nx + ctx.interior[iy] * ny;
        ghost[ix] -= 2.0 * mn * nx;
        ghost[iy] -= 2.0 * mn * ny;
    }
}
