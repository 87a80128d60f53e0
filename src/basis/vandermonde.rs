//! Vandermonde matrix for nodal-modal transformations.
//!
//! V[i,j] = φ_j(r_i) with φ_j the orthonormal Legendre polynomials, so
//! nodal = V · modal. Lagrange bases on arbitrary point sets are evaluated
//! through V⁻¹: ℓ_i(x) = Σ_j φ_j(x) V⁻¹[j,i].

use crate::polynomial::legendre_normalized;
use faer::{Mat, linalg::solvers::Solve};

/// Vandermonde matrix, its inverse and its derivative on a nodal set.
#[derive(Clone)]
pub struct Vandermonde {
    /// V[i,j] = φ_j(r_i)
    pub v: Mat<f64>,
    /// V⁻¹
    pub v_inv: Mat<f64>,
    /// Vr[i,j] = φ'_j(r_i)
    pub vr: Mat<f64>,
    /// Nodes the Vandermonde was built on
    pub nodes: Vec<f64>,
}

impl Vandermonde {
    /// Build on `nodes` (polynomial degree `nodes.len() - 1`).
    pub fn new(nodes: &[f64]) -> Self {
        let v = Self::modal_values(nodes.len(), nodes);
        let vr = Self::modal_derivatives(nodes.len(), nodes);

        let n = nodes.len();
        let lu = v.as_ref().full_piv_lu();
        let mut v_inv = Mat::zeros(n, n);
        for j in 0..n {
            let mut rhs = Mat::zeros(n, 1);
            rhs[(j, 0)] = 1.0;
            let col = lu.solve(&rhs);
            for i in 0..n {
                v_inv[(i, j)] = col[(i, 0)];
            }
        }

        Self {
            v,
            v_inv,
            vr,
            nodes: nodes.to_vec(),
        }
    }

    /// Number of nodes (and modes).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lagrange basis of this node set evaluated at `points`.
    ///
    /// Returns M with M[m,i] = ℓ_i(points_m), shape `points.len() × len()`.
    pub fn interpolation_to(&self, points: &[f64]) -> Mat<f64> {
        &Self::modal_values(self.len(), points) * &self.v_inv
    }

    /// Derivatives of the Lagrange basis of this node set at `points`.
    ///
    /// Returns M with M[m,i] = ℓ_i'(points_m).
    pub fn derivative_at(&self, points: &[f64]) -> Mat<f64> {
        &Self::modal_derivatives(self.len(), points) * &self.v_inv
    }

    fn modal_values(n_modes: usize, points: &[f64]) -> Mat<f64> {
        Mat::from_fn(points.len(), n_modes, |i, j| legendre_normalized(j, points[i]).0)
    }

    fn modal_derivatives(n_modes: usize, points: &[f64]) -> Mat<f64> {
        Mat::from_fn(points.len(), n_modes, |i, j| legendre_normalized(j, points[i]).1)
    }
}
