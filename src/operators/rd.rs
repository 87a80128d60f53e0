//! Residual-distribution operators for tensor-product quadrilaterals.
//!
//! All matrices are built once from two 1D point sets:
//! - the native solution points `s` (`order + 1` points)
//! - the extended points `r` (`order + 2` points: -1, GL(order), +1)
//!
//! The extended points bound the finite-volume subcells of a solution line:
//! subcell `i` is `[r_i, r_{i+1}]` and contains solution point `s_i`.

use crate::basis::Vandermonde;
use crate::polynomial::{PointLayout, extended_nodes};
use faer::Mat;

/// Operator matrices for one element shape and order.
#[derive(Clone, Debug)]
pub struct RdOperators {
    /// Polynomial order p
    pub order: usize,
    /// Solution points per line = p+1
    pub n_1d: usize,
    /// Extended points per line = p+2
    pub n_ext: usize,
    /// Solution points per element = (p+1)²
    pub n_upts: usize,
    /// Native point layout
    pub layout: PointLayout,
    /// Native 1D points
    pub nodes: Vec<f64>,
    /// Native 1D quadrature weights
    pub weights_1d: Vec<f64>,
    /// Tensor weights, indexed like solution points: w[i + j(p+1)]
    pub weights: Vec<f64>,
    /// Extended 1D points
    pub ext_nodes: Vec<f64>,

    /// Interpolation (p+2 × p+1): interp[m, i] = ℓ_i^s(r_m)
    pub interp: Mat<f64>,
    /// RD differentiation (p+1 × p+2): diff_rd[i, m] = (ℓ_m^r)'(s_i)
    pub diff_rd: Mat<f64>,
    /// Subcell differentiation (p+1 × p+2): ±1/(r_{i+1} - r_i) on the bands
    pub diff_subcell: Mat<f64>,
    /// Smoothing stencil (n_upts × n_upts)
    pub smoothing: Mat<f64>,

    /// Row-major cache: interp_row_major[m * n_1d + i] = interp[(m, i)]
    pub interp_row_major: Vec<f64>,
    /// Row-major cache: diff_rd_row_major[i * n_ext + m] = diff_rd[(i, m)]
    pub diff_rd_row_major: Vec<f64>,
    /// Row-major cache: diff_subcell_row_major[i * n_ext + m]
    pub diff_subcell_row_major: Vec<f64>,
    /// Row-major cache: smoothing_row_major[a * n_upts + b]
    pub smoothing_row_major: Vec<f64>,
}

impl RdOperators {
    /// Build every operator for `order` on the given native layout.
    pub fn new(order: usize, layout: PointLayout) -> Self {
        let n_1d = order + 1;
        let n_ext = order + 2;
        let nodes = layout.nodes(order);
        let weights_1d = layout.weights(order);
        let ext_nodes = extended_nodes(order);

        let mut weights = vec![0.0; n_1d * n_1d];
        for j in 0..n_1d {
            for i in 0..n_1d {
                weights[i + j * n_1d] = weights_1d[i] * weights_1d[j];
            }
        }

        let interp = interpolation_matrix(&nodes, &ext_nodes);
        let diff_rd = rd_differentiation_matrix(&ext_nodes, &nodes);
        let diff_subcell = subcell_differentiation_matrix(&ext_nodes);
        let smoothing = smoothing_matrix(&nodes);

        Self {
            order,
            n_1d,
            n_ext,
            n_upts: n_1d * n_1d,
            layout,
            interp_row_major: mat_to_row_major(&interp),
            diff_rd_row_major: mat_to_row_major(&diff_rd),
            diff_subcell_row_major: mat_to_row_major(&diff_subcell),
            smoothing_row_major: mat_to_row_major(&smoothing),
            nodes,
            weights_1d,
            weights,
            ext_nodes,
            interp,
            diff_rd,
            diff_subcell,
            smoothing,
        }
    }

    /// Solution point index of (i along ξ, j along η).
    #[inline]
    pub fn upt(&self, i: usize, j: usize) -> usize {
        i + j * self.n_1d
    }

    /// Number of face points per element = 4(p+1).
    #[inline]
    pub fn n_fpts(&self) -> usize {
        4 * self.n_1d
    }
}

/// Lagrange basis on `native` evaluated at `ext`: M[m, i] = ℓ_i(ext_m).
pub fn interpolation_matrix(native: &[f64], ext: &[f64]) -> Mat<f64> {
    Vandermonde::new(native).interpolation_to(ext)
}

/// Derivative of the Lagrange basis on `ext` at `native`: M[i, m] = ℓ_m'(native_i).
pub fn rd_differentiation_matrix(ext: &[f64], native: &[f64]) -> Mat<f64> {
    Vandermonde::new(ext).derivative_at(native)
}

/// First-order subcell difference over the cells bounded by `ext`.
///
/// Row i holds -1/Δ_i at column i and +1/Δ_i at column i+1, Δ_i = ext[i+1] - ext[i].
pub fn subcell_differentiation_matrix(ext: &[f64]) -> Mat<f64> {
    let n = ext.len() - 1;
    let mut m = Mat::zeros(n, ext.len());
    for i in 0..n {
        let inv = 1.0 / (ext[i + 1] - ext[i]);
        m[(i, i)] = -inv;
        m[(i, i + 1)] = inv;
    }
    m
}

/// One pass of inverse-distance weighted averaging over the 2D point lattice.
///
/// Node (i, j) keeps weight 1/2 and spreads the other 1/2 over its four
/// face neighbours (clamped at the lattice edge) in proportion to the
/// inverse neighbour distance. A direction where either neighbour
/// coincides with the node contributes nothing; a node with no remaining
/// neighbour maps to itself.
pub fn smoothing_matrix(nodes: &[f64]) -> Mat<f64> {
    let n = nodes.len();
    let p = n - 1;
    let idx = |i: usize, j: usize| i + j * n;
    let mut m = Mat::zeros(n * n, n * n);

    // Inverse distances to the (lower, upper) neighbours along one line
    let inverse_pair = |k: usize| -> (f64, f64) {
        let lo = (nodes[k.saturating_sub(1)] - nodes[k]).abs();
        let hi = (nodes[(k + 1).min(p)] - nodes[k]).abs();
        if lo != 0.0 && hi != 0.0 {
            (1.0 / lo, 1.0 / hi)
        } else {
            (0.0, 0.0)
        }
    };

    for j in 0..n {
        for i in 0..n {
            let row = idx(i, j);
            let (xm, xp) = inverse_pair(i);
            let (ym, yp) = inverse_pair(j);
            let dtot = xm + xp + ym + yp;

            if dtot == 0.0 {
                m[(row, row)] = 1.0;
                continue;
            }

            m[(row, row)] = 0.5;
            m[(row, idx(i.saturating_sub(1), j))] += 0.5 * xm / dtot;
            m[(row, idx((i + 1).min(p), j))] += 0.5 * xp / dtot;
            m[(row, idx(i, j.saturating_sub(1)))] += 0.5 * ym / dtot;
            m[(row, idx(i, (j + 1).min(p)))] += 0.5 * yp / dtot;
        }
    }
    m
}

pub(crate) fn mat_to_row_major(m: &Mat<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(m.nrows() * m.ncols());
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            out.push(m[(i, j)]);
        }
    }
    out
}
