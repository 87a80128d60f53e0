//! Numerical fluxes for element interfaces and subcell faces.
//!
//! All fluxes take the outward unit normal of the left state and return the
//! common normal flux per unit length, F*(u_l, u_r; n).

mod hll;
mod rusanov;

pub use hll::hll_flux;
pub use rusanov::{central_flux, rusanov_flux};

use crate::equations::FluxModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approximate Riemann solver selected by `solver-interfaces.riemann-solver`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiemannSolver {
    #[default]
    Rusanov,
    Hll,
}

impl RiemannSolver {
    /// Upwind common flux.
    #[inline]
    pub fn flux(
        self,
        model: &dyn FluxModel,
        u_l: &[f64],
        u_r: &[f64],
        n: (f64, f64),
        out: &mut [f64],
    ) {
        match self {
            RiemannSolver::Rusanov => rusanov_flux(model, u_l, u_r, n, out),
            RiemannSolver::Hll => hll_flux(model, u_l, u_r, n, out),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RiemannSolver::Rusanov => "rusanov",
            RiemannSolver::Hll => "hll",
        }
    }
}

impl fmt::Display for RiemannSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RiemannSolver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rusanov" | "lax-friedrichs" => Ok(RiemannSolver::Rusanov),
            "hll" => Ok(RiemannSolver::Hll),
            other => Err(format!("unknown Riemann solver '{other}'")),
        }
    }
}

/// Flux law used at a face: the configured upwind solver or the central mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceFlux {
    Upwind(RiemannSolver),
    Centered,
}

impl FaceFlux {
    #[inline]
    pub fn flux(
        self,
        model: &dyn FluxModel,
        u_l: &[f64],
        u_r: &[f64],
        n: (f64, f64),
        out: &mut [f64],
    ) {
        match self {
            FaceFlux::Upwind(rs) => rs.flux(model, u_l, u_r, n, out),
            FaceFlux::Centered => central_flux(model, u_l, u_r, n, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::Euler2D;

    #[test]
    fn test_solvers_agree_on_constant_state() {
        let eq = Euler2D::new(1.4);
        let u = eq.conserved(1.0, 0.5, 0.2, 1.0);
        let n = (0.0, 1.0);
        let (mut a, mut b, mut c) = ([0.0; 4], [0.0; 4], [0.0; 4]);
        RiemannSolver::Rusanov.flux(&eq, &u, &u, n, &mut a);
        RiemannSolver::Hll.flux(&eq, &u, &u, n, &mut b);
        FaceFlux::Centered.flux(&eq, &u, &u, n, &mut c);
        for v in 0..4 {
            assert!((a[v] - b[v]).abs() < 1e-13);
            assert!((a[v] - c[v]).abs() < 1e-13);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("hll".parse::<RiemannSolver>().unwrap(), RiemannSolver::Hll);
        assert_eq!(
            "rusanov".parse::<RiemannSolver>().unwrap(),
            RiemannSolver::Rusanov
        );
        assert!("roe".parse::<RiemannSolver>().is_err());
    }
}
