//! Structured quadrilateral meshes.
//!
//! Elements are numbered row by row, `e = i + j * nx`, with vertices listed
//! counter-clockwise from the lower-left corner. Local face `f` runs from
//! vertex `f` to vertex `(f + 1) % 4`, so faces 0..4 are south, east, north
//! and west. Periodic directions wrap their edges around; every other
//! outer edge carries a [`BoundaryTag`].

use super::boundary_tags::BoundaryTag;

/// Reference to an element and one of its faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementFace {
    pub element: usize,
    pub face: usize,
}

impl ElementFace {
    pub fn new(element: usize, face: usize) -> Self {
        Self { element, face }
    }
}

/// An edge shared by one or two element faces.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Owner side
    pub left: ElementFace,
    /// Neighbour side (None on a physical boundary)
    pub right: Option<ElementFace>,
    /// Tag of a physical boundary edge
    pub boundary_tag: Option<BoundaryTag>,
}

impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.right.is_none()
    }
}

/// Sides of a rectangular domain, in the order used by side-tag arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    South = 0,
    East = 1,
    North = 2,
    West = 3,
}

/// 2D mesh of quadrilateral elements on a structured `nx × ny` grid.
#[derive(Clone, Debug)]
pub struct Mesh2D {
    /// Vertex coordinates
    pub vertices: Vec<(f64, f64)>,
    /// Counter-clockwise vertex indices per element
    pub elements: Vec<[usize; 4]>,
    /// All edges; horizontal edges first, then vertical ones
    pub edges: Vec<Edge>,
    /// Edge index of each element face
    pub element_edges: Vec<[usize; 4]>,
    pub n_elements: usize,
    /// Elements in x
    pub nx: usize,
    /// Elements in y
    pub ny: usize,
}

impl Mesh2D {
    /// Uniform mesh of [x0, x1] × [y0, y1] with walls on every side.
    pub fn uniform_rectangle(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> Self {
        Self::uniform_rectangle_with_sides(x0, x1, y0, y1, nx, ny, [BoundaryTag::Wall; 4])
    }

    /// Uniform mesh with a tag per side, ordered [south, east, north, west].
    pub fn uniform_rectangle_with_sides(
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        nx: usize,
        ny: usize,
        tags: [BoundaryTag; 4],
    ) -> Self {
        Self::structured(x0, x1, y0, y1, nx, ny, (false, false), tags)
    }

    /// Mesh periodic in x, with tagged south and north sides.
    #[allow(clippy::too_many_arguments)]
    pub fn channel_periodic_x(
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        nx: usize,
        ny: usize,
        south: BoundaryTag,
        north: BoundaryTag,
    ) -> Self {
        let tags = [south, BoundaryTag::Wall, north, BoundaryTag::Wall];
        Self::structured(x0, x1, y0, y1, nx, ny, (true, false), tags)
    }

    /// Mesh periodic in both directions.
    pub fn uniform_periodic(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> Self {
        Self::structured(x0, x1, y0, y1, nx, ny, (true, true), [BoundaryTag::Wall; 4])
    }

    #[allow(clippy::too_many_arguments)]
    fn structured(
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        nx: usize,
        ny: usize,
        periodic: (bool, bool),
        tags: [BoundaryTag; 4],
    ) -> Self {
        assert!(
            nx > 0 && ny > 0,
            "Need at least one element in each direction"
        );
        assert!(x1 > x0 && y1 > y0, "Invalid domain bounds");

        let dx = (x1 - x0) / nx as f64;
        let dy = (y1 - y0) / ny as f64;

        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push((x0 + i as f64 * dx, y0 + j as f64 * dy));
            }
        }

        let mut elements = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let v0 = j * (nx + 1) + i;
                let v1 = v0 + 1;
                let v2 = v1 + (nx + 1);
                let v3 = v0 + (nx + 1);
                elements.push([v0, v1, v2, v3]);
            }
        }

        let elem = |i: usize, j: usize| j * nx + i;
        let mut edges = Vec::new();
        let mut element_edges = vec![[usize::MAX; 4]; nx * ny];
        let mut push = |edge: Edge, element_edges: &mut Vec<[usize; 4]>| {
            let id = edges.len();
            element_edges[edge.left.element][edge.left.face] = id;
            if let Some(r) = edge.right {
                element_edges[r.element][r.face] = id;
            }
            edges.push(edge);
        };

        // Horizontal edges: row j lies between element rows j-1 and j
        let (x_periodic, y_periodic) = periodic;
        for j in 0..=ny {
            if j == ny && y_periodic {
                continue;
            }
            for i in 0..nx {
                let edge = if j == 0 {
                    let left = ElementFace::new(elem(i, 0), 0);
                    if y_periodic {
                        Edge {
                            left,
                            right: Some(ElementFace::new(elem(i, ny - 1), 2)),
                            boundary_tag: None,
                        }
                    } else {
                        boundary_edge(left, tags[Side::South as usize])
                    }
                } else if j == ny {
                    boundary_edge(ElementFace::new(elem(i, ny - 1), 2), tags[Side::North as usize])
                } else {
                    Edge {
                        left: ElementFace::new(elem(i, j - 1), 2),
                        right: Some(ElementFace::new(elem(i, j), 0)),
                        boundary_tag: None,
                    }
                };
                push(edge, &mut element_edges);
            }
        }

        // Vertical edges: column i lies between element columns i-1 and i
        for j in 0..ny {
            for i in 0..=nx {
                if i == nx && x_periodic {
                    continue;
                }
                let edge = if i == 0 {
                    let left = ElementFace::new(elem(0, j), 3);
                    if x_periodic {
                        Edge {
                            left,
                            right: Some(ElementFace::new(elem(nx - 1, j), 1)),
                            boundary_tag: None,
                        }
                    } else {
                        boundary_edge(left, tags[Side::West as usize])
                    }
                } else if i == nx {
                    boundary_edge(ElementFace::new(elem(nx - 1, j), 1), tags[Side::East as usize])
                } else {
                    Edge {
                        left: ElementFace::new(elem(i - 1, j), 1),
                        right: Some(ElementFace::new(elem(i, j), 3)),
                        boundary_tag: None,
                    }
                };
                push(edge, &mut element_edges);
            }
        }

        Self {
            vertices,
            n_elements: elements.len(),
            elements,
            edges,
            element_edges,
            nx,
            ny,
        }
    }

    /// Vertex coordinates of an element.
    pub fn element_vertices(&self, k: usize) -> [(f64, f64); 4] {
        self.elements[k].map(|v| self.vertices[v])
    }

    /// Neighbour across a face, if any.
    pub fn neighbor(&self, element: usize, face: usize) -> Option<ElementFace> {
        let edge = &self.edges[self.element_edges[element][face]];
        if edge.left == ElementFace::new(element, face) {
            edge.right
        } else {
            Some(edge.left)
        }
    }

    /// Grid column of an element.
    #[inline]
    pub fn column(&self, element: usize) -> usize {
        element % self.nx
    }
}

fn boundary_edge(left: ElementFace, tag: BoundaryTag) -> Edge {
    Edge {
        left,
        right: None,
        boundary_tag: Some(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_counts() {
        let mesh = Mesh2D::uniform_rectangle(0.0, 3.0, 0.0, 2.0, 3, 2);
        assert_eq!(mesh.n_elements, 6);
        assert_eq!(mesh.vertices.len(), 12);
        // 3×3 horizontal + 4×2 vertical
        assert_eq!(mesh.edges.len(), 17);
        assert_eq!(mesh.edges.iter().filter(|e| e.is_boundary()).count(), 10);
    }

    #[test]
    fn test_every_face_has_an_edge() {
        for mesh in [
            Mesh2D::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 4, 3),
            Mesh2D::uniform_periodic(0.0, 1.0, 0.0, 1.0, 4, 3),
            Mesh2D::channel_periodic_x(0.0, 1.0, 0.0, 1.0, 2, 2, BoundaryTag::Wall, BoundaryTag::Outflow),
        ] {
            for faces in &mesh.element_edges {
                assert!(faces.iter().all(|&e| e < mesh.edges.len()));
            }
        }
    }

    #[test]
    fn test_periodic_neighbors() {
        let mesh = Mesh2D::uniform_periodic(0.0, 1.0, 0.0, 1.0, 3, 2);
        assert!(mesh.edges.iter().all(|e| !e.is_boundary()));
        // Left face of column 0 wraps to the right face of column 2
        assert_eq!(mesh.neighbor(0, 3), Some(ElementFace::new(2, 1)));
        assert_eq!(mesh.neighbor(2, 1), Some(ElementFace::new(0, 3)));
        // Bottom of row 0 wraps to the top of row 1
        assert_eq!(mesh.neighbor(1, 0), Some(ElementFace::new(4, 2)));
    }

    #[test]
    fn test_side_tags() {
        let tags = [
            BoundaryTag::Wall,
            BoundaryTag::Outflow,
            BoundaryTag::FarField,
            BoundaryTag::Inflow,
        ];
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 2.0, 0.0, 1.0, 2, 1, tags);
        let tag_of = |k: usize, f: usize| mesh.edges[mesh.element_edges[k][f]].boundary_tag;
        assert_eq!(tag_of(0, 0), Some(BoundaryTag::Wall));
        assert_eq!(tag_of(1, 1), Some(BoundaryTag::Outflow));
        assert_eq!(tag_of(0, 2), Some(BoundaryTag::FarField));
        assert_eq!(tag_of(0, 3), Some(BoundaryTag::Inflow));
        assert_eq!(tag_of(0, 1), None);
    }

    #[test]
    fn test_element_vertices_ccw() {
        let mesh = Mesh2D::uniform_rectangle(0.0, 2.0, 0.0, 1.0, 2, 1);
        let v = mesh.element_vertices(1);
        assert_eq!(v, [(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)]);
    }
}
