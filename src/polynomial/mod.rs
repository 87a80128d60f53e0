//! Polynomial evaluation and point sets.
//!
//! This module provides:
//! - Legendre polynomials and their derivatives
//! - Gauss-Legendre and Gauss-Lobatto-Legendre points and weights
//! - The extended point set used by residual distribution

mod legendre;
mod nodes;

pub use legendre::{legendre, legendre_and_derivative, legendre_derivative, legendre_normalized};
pub use nodes::{
    PointLayout, extended_nodes, gauss_legendre_nodes, gauss_legendre_weights,
    gauss_lobatto_nodes, gauss_lobatto_weights,
};
