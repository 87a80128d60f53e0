//! Interface sets and their common-flux kernels.
//!
//! Every interface kernel reads the extrapolated states left in the face
//! buffer by the element kernels and overwrites them, in place, with the
//! common outward normal flux per unit length:
//!
//! | Set | Right state |
//! |-----|-------------|
//! | [`InteriorInterfaces`] | the paired face point of the neighbour |
//! | [`BoundaryInterfaces`] | the ghost state of the boundary condition |
//! | [`MpiInterfaces`] | the unpacked view of the neighbouring partition |

mod boundary;
mod interior;
mod mpi;

pub use boundary::{BoundaryFlux, BoundaryGroup, BoundaryInterfaces, BoundaryPoint};
pub use interior::{FacePair, InteriorFlux, InteriorInterfaces};
pub use mpi::{MpiFlux, MpiInterface, MpiInterfaces, Pack, Recv, Send, Unpack};

use crate::elements::ElementContext;

/// Face-point slot (index into a face buffer divided by nvars) of point
/// `m` on `face` of element `e`.
#[inline]
pub(crate) fn fpt_slot(ctx: &ElementContext, e: usize, face: usize, m: usize) -> usize {
    e * ctx.points.n_fpts() + ctx.points.fpt(face, m)
}
