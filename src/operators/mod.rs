//! Precomputed operators for the residual-distribution scheme.
//!
//! This module provides:
//! - Interpolation, RD differentiation, subcell differentiation and
//!   smoothing matrices (`RdOperators`)
//! - Face-point numbering for quadrilaterals (`QuadPoints`)
//! - Constant metric terms of affine elements (`ElementMetrics`)

mod faces;
mod geometric;
mod rd;

pub use faces::{FACE_NORMALS, LineDir, LineEnd, QuadPoints};
pub use geometric::{ElementMetrics, reference_to_physical};
pub use rd::{
    RdOperators, interpolation_matrix, rd_differentiation_matrix, smoothing_matrix,
    subcell_differentiation_matrix,
};
