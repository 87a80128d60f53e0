//! Column-block partitioning of structured meshes.
//!
//! Each partition receives a contiguous block of grid columns and a local
//! view of the faces it touches:
//! - interior faces, with both sides local
//! - boundary faces, with the physical boundary tag
//! - remote faces, whose neighbour lives on another partition
//!
//! Remote faces are ordered by (neighbour rank, global edge id), which both
//! sides of a partition boundary agree on. Exchange buffers use that order.

use super::mesh2d::{ElementFace, Mesh2D};
use super::BoundaryTag;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while splitting a mesh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("cannot split {columns} columns into {parts} partitions")]
    TooManyPartitions { columns: usize, parts: usize },

    #[error("partition count must be at least one")]
    NoPartitions,
}

/// A face whose neighbour is owned by another partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteFace {
    /// Local side
    pub face: ElementFace,
    /// Rank owning the neighbour
    pub rank: usize,
    /// Global edge id
    pub edge: usize,
}

/// One partition's share of a mesh, in local element numbering.
#[derive(Clone, Debug)]
pub struct PartitionMesh {
    pub rank: usize,
    pub n_parts: usize,
    /// Global id of each local element
    pub global_ids: Vec<usize>,
    /// Vertex coordinates per local element
    pub element_vertices: Vec<[(f64, f64); 4]>,
    /// Local face pairs (owner, neighbour)
    pub interior: Vec<(ElementFace, ElementFace)>,
    /// Physical boundary faces
    pub boundary: Vec<(ElementFace, BoundaryTag)>,
    /// Faces shared with other partitions
    pub remote: Vec<RemoteFace>,
}

impl PartitionMesh {
    pub fn n_elements(&self) -> usize {
        self.global_ids.len()
    }

    /// Ranks this partition exchanges face data with, ascending.
    pub fn neighbor_ranks(&self) -> Vec<usize> {
        let mut ranks: Vec<usize> = self.remote.iter().map(|r| r.rank).collect();
        ranks.dedup();
        ranks
    }

    /// Remote faces shared with one neighbour, in exchange order.
    pub fn remote_faces(&self, rank: usize) -> impl Iterator<Item = &RemoteFace> {
        self.remote.iter().filter(move |r| r.rank == rank)
    }

    /// Distinct boundary tags present, ascending.
    pub fn boundary_tags(&self) -> Vec<BoundaryTag> {
        let mut tags: Vec<BoundaryTag> = self.boundary.iter().map(|(_, t)| *t).collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

impl Mesh2D {
    /// Owning rank of a global element when split into `n_parts` column blocks.
    pub fn owner(&self, element: usize, n_parts: usize) -> usize {
        self.column(element) * n_parts / self.nx
    }

    /// The whole mesh as a single partition.
    pub fn single_partition(&self) -> PartitionMesh {
        self.partition_rank(0, 1)
    }

    /// Split into `n_parts` blocks of grid columns.
    pub fn partition(&self, n_parts: usize) -> Result<Vec<PartitionMesh>, MeshError> {
        if n_parts == 0 {
            return Err(MeshError::NoPartitions);
        }
        if n_parts > self.nx {
            return Err(MeshError::TooManyPartitions {
                columns: self.nx,
                parts: n_parts,
            });
        }
        Ok((0..n_parts)
            .map(|rank| self.partition_rank(rank, n_parts))
            .collect())
    }

    fn partition_rank(&self, rank: usize, n_parts: usize) -> PartitionMesh {
        let global_ids: Vec<usize> = (0..self.n_elements)
            .filter(|&k| self.owner(k, n_parts) == rank)
            .collect();
        let local: HashMap<usize, usize> = global_ids
            .iter()
            .enumerate()
            .map(|(l, &g)| (g, l))
            .collect();
        let to_local = |f: ElementFace| ElementFace::new(local[&f.element], f.face);

        let mut interior = Vec::new();
        let mut boundary = Vec::new();
        let mut remote = Vec::new();

        for (id, edge) in self.edges.iter().enumerate() {
            let left_here = local.contains_key(&edge.left.element);
            match (edge.right, edge.boundary_tag) {
                (None, Some(tag)) if left_here => boundary.push((to_local(edge.left), tag)),
                (Some(right), _) => {
                    let right_here = local.contains_key(&right.element);
                    match (left_here, right_here) {
                        (true, true) => interior.push((to_local(edge.left), to_local(right))),
                        (true, false) => remote.push(RemoteFace {
                            face: to_local(edge.left),
                            rank: self.owner(right.element, n_parts),
                            edge: id,
                        }),
                        (false, true) => remote.push(RemoteFace {
                            face: to_local(right),
                            rank: self.owner(edge.left.element, n_parts),
                            edge: id,
                        }),
                        (false, false) => {}
                    }
                }
                _ => {}
            }
        }
        remote.sort_by_key(|r| (r.rank, r.edge));

        PartitionMesh {
            rank,
            n_parts,
            element_vertices: global_ids.iter().map(|&g| self.element_vertices(g)).collect(),
            global_ids,
            interior,
            boundary,
            remote,
        }
    }
}
