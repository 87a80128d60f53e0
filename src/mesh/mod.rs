//! Mesh representation and partitioning plumbing.
//!
//! - `Mesh2D`: structured quadrilateral mesh with edge connectivity
//! - `PartitionMesh`: one partition's local elements and face lists
//! - `BoundaryTag`: boundary edge classification

mod boundary_tags;
mod mesh2d;
mod partition;

pub use boundary_tags::BoundaryTag;
pub use mesh2d::{Edge, ElementFace, Mesh2D, Side};
pub use partition::{MeshError, PartitionMesh, RemoteFace};
