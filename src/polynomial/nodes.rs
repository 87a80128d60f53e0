//! One-dimensional point sets on [-1, 1].
//!
//! Solution points live on either the Gauss-Legendre or the
//! Gauss-Lobatto-Legendre set. The residual-distribution operators
//! additionally use an *extended* set of `order + 2` points: the two cell
//! endpoints around `order` interior Gauss-Legendre points.

use super::legendre::legendre_and_derivative;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

const NEWTON_MAX_ITERS: usize = 100;
const NEWTON_TOL: f64 = 1e-15;

/// Layout of the native solution points of a tensor-product element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointLayout {
    /// Roots of P_{N+1}; interior points only.
    #[default]
    GaussLegendre,
    /// Roots of (1 - x²) P'_N; includes both endpoints.
    #[serde(rename = "gauss-legendre-lobatto")]
    GaussLobatto,
}

impl PointLayout {
    /// Points for polynomial order `order` (`order + 1` points, ascending).
    pub fn nodes(self, order: usize) -> Vec<f64> {
        match self {
            PointLayout::GaussLegendre => gauss_legendre_nodes(order + 1),
            PointLayout::GaussLobatto => gauss_lobatto_nodes(order),
        }
    }

    /// Quadrature weights matching [`PointLayout::nodes`].
    pub fn weights(self, order: usize) -> Vec<f64> {
        let nodes = self.nodes(order);
        match self {
            PointLayout::GaussLegendre => gauss_legendre_weights(&nodes),
            PointLayout::GaussLobatto => gauss_lobatto_weights(order, &nodes),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PointLayout::GaussLegendre => "gauss-legendre",
            PointLayout::GaussLobatto => "gauss-legendre-lobatto",
        }
    }
}

impl fmt::Display for PointLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PointLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauss-legendre" => Ok(PointLayout::GaussLegendre),
            "gauss-legendre-lobatto" | "gauss-lobatto" => Ok(PointLayout::GaussLobatto),
            other => Err(format!("unknown solution point layout '{other}'")),
        }
    }
}

/// The `n` Gauss-Legendre points (roots of P_n), ascending.
///
/// Newton iteration from the Chebyshev-Gauss initial guess.
pub fn gauss_legendre_nodes(n: usize) -> Vec<f64> {
    let mut nodes: Vec<f64> = (0..n)
        .map(|j| {
            let mut x = -(PI * (j as f64 + 0.75) / (n as f64 + 0.5)).cos();
            for _ in 0..NEWTON_MAX_ITERS {
                let (p, dp) = legendre_and_derivative(n, x);
                let dx = p / dp;
                x -= dx;
                if dx.abs() < NEWTON_TOL {
                    break;
                }
            }
            x
        })
        .collect();

    // Symmetrize to remove round-off drift between mirrored roots
    for j in 0..n / 2 {
        let a = 0.5 * (nodes[n - 1 - j] - nodes[j]);
        nodes[j] = -a;
        nodes[n - 1 - j] = a;
    }
    if n % 2 == 1 {
        nodes[n / 2] = 0.0;
    }
    nodes
}

/// Gauss-Legendre weights w_j = 2 / ((1 - x_j²) P'_n(x_j)²).
pub fn gauss_legendre_weights(nodes: &[f64]) -> Vec<f64> {
    let n = nodes.len();
    nodes
        .iter()
        .map(|&x| {
            let (_, dp) = legendre_and_derivative(n, x);
            2.0 / ((1.0 - x * x) * dp * dp)
        })
        .collect()
}

/// The `order + 1` Gauss-Lobatto-Legendre points, ascending.
pub fn gauss_lobatto_nodes(order: usize) -> Vec<f64> {
    match order {
        0 => return vec![0.0],
        1 => return vec![-1.0, 1.0],
        _ => {}
    }

    let n = order as f64;
    let mut nodes: Vec<f64> = (0..=order)
        .map(|j| -(PI * j as f64 / n).cos())
        .collect();

    for x in nodes.iter_mut().take(order).skip(1) {
        for _ in 0..NEWTON_MAX_ITERS {
            // Zeros of (1-x²)P'_N; its derivative reduces to -N(N+1)P_N
            let (p, dp) = legendre_and_derivative(order, *x);
            let dx = (1.0 - *x * *x) * dp / (n * (n + 1.0) * p);
            *x += dx;
            if dx.abs() < NEWTON_TOL {
                break;
            }
        }
    }

    nodes[0] = -1.0;
    nodes[order] = 1.0;
    nodes
}

/// Gauss-Lobatto weights w_j = 2 / (N(N+1) P_N(x_j)²).
pub fn gauss_lobatto_weights(order: usize, nodes: &[f64]) -> Vec<f64> {
    if order == 0 {
        return vec![2.0];
    }
    let denom = (order * (order + 1)) as f64;
    nodes
        .iter()
        .map(|&x| {
            let (p, _) = legendre_and_derivative(order, x);
            2.0 / (denom * p * p)
        })
        .collect()
}

/// Extended point set for order `order`: `[-1, GL(order)..., 1]`.
pub fn extended_nodes(order: usize) -> Vec<f64> {
    let mut pts = Vec::with_capacity(order + 2);
    pts.push(-1.0);
    pts.extend(gauss_legendre_nodes(order));
    pts.push(1.0);
    pts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrate(nodes: &[f64], weights: &[f64], k: i32) -> f64 {
        nodes
            .iter()
            .zip(weights)
            .map(|(&x, &w)| w * x.powi(k))
            .sum()
    }

    fn exact_monomial(k: i32) -> f64 {
        if k % 2 == 0 { 2.0 / (k + 1) as f64 } else { 0.0 }
    }

    #[test]
    fn test_gauss_legendre_exactness() {
        for n in 1..=7 {
            let nodes = gauss_legendre_nodes(n);
            let weights = gauss_legendre_weights(&nodes);
            for k in 0..(2 * n as i32) {
                let err = (integrate(&nodes, &weights, k) - exact_monomial(k)).abs();
                assert!(err < 1e-13, "n = {}, degree {}: error {}", n, k, err);
            }
        }
    }

    #[test]
    fn test_gauss_legendre_known_values() {
        let nodes = gauss_legendre_nodes(2);
        let r = 1.0 / 3.0_f64.sqrt();
        assert!((nodes[0] + r).abs() < 1e-15);
        assert!((nodes[1] - r).abs() < 1e-15);
        assert_eq!(gauss_legendre_nodes(1), vec![0.0]);
    }

    #[test]
    fn test_gauss_lobatto_exactness() {
        for order in 1..=6 {
            let nodes = gauss_lobatto_nodes(order);
            let weights = gauss_lobatto_weights(order, &nodes);
            for k in 0..(2 * order as i32) {
                let err = (integrate(&nodes, &weights, k) - exact_monomial(k)).abs();
                assert!(err < 1e-12, "order {}, degree {}: error {}", order, k, err);
            }
        }
    }

    #[test]
    fn test_extended_nodes_layout() {
        for order in 1..=5 {
            let pts = extended_nodes(order);
            assert_eq!(pts.len(), order + 2);
            assert_eq!(pts[0], -1.0);
            assert_eq!(pts[order + 1], 1.0);
            assert!(pts.windows(2).all(|w| w[1] > w[0]), "not ascending");
        }
    }

    #[test]
    fn test_layout_parsing() {
        assert_eq!(
            "gauss-legendre".parse::<PointLayout>().unwrap(),
            PointLayout::GaussLegendre
        );
        assert_eq!(
            "gauss-legendre-lobatto".parse::<PointLayout>().unwrap(),
            PointLayout::GaussLobatto
        );
        assert!("chebyshev".parse::<PointLayout>().is_err());
    }
}
