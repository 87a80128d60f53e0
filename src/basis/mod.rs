//! Polynomial basis representations.
//!
//! Vandermonde matrices connect nodal and modal representations and give
//! Lagrange interpolation/differentiation between arbitrary 1D point sets.

mod vandermonde;

pub use vandermonde::Vandermonde;
