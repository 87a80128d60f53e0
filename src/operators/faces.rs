//! Face-point numbering for tensor-product quadrilaterals.
//!
//! Face convention (counter-clockwise):
//! - Face 0 (bottom): η = -1, ξ from -1 to +1
//! - Face 1 (right):  ξ = +1, η from -1 to +1
//! - Face 2 (top):    η = +1, ξ from +1 to -1 (reversed)
//! - Face 3 (left):   ξ = -1, η from +1 to -1 (reversed)
//!
//! Face point `m` of face `f` is stored at `f(p+1) + m`. Two elements that
//! share a face walk it in opposite directions, so point `m` on one side
//! pairs with point `p - m` on the other.

/// Outward unit normal of each face of the reference square.
pub const FACE_NORMALS: [(f64, f64); 4] = [(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)];

/// Reference direction of a solution line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineDir {
    /// Line of constant η, running along ξ
    Xi,
    /// Line of constant ξ, running along η
    Eta,
}

/// Where a face point sits at the end of a solution line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEnd {
    pub dir: LineDir,
    /// Index of the line (η index for `Xi`, ξ index for `Eta`)
    pub line: usize,
    /// True at the +1 end of the line
    pub high: bool,
}

/// Index helper for the solution and face points of one element.
#[derive(Clone, Copy, Debug)]
pub struct QuadPoints {
    /// Points per line = p+1
    pub n_1d: usize,
}

impl QuadPoints {
    pub fn new(order: usize) -> Self {
        Self { n_1d: order + 1 }
    }

    #[inline]
    pub fn n_upts(&self) -> usize {
        self.n_1d * self.n_1d
    }

    #[inline]
    pub fn n_fpts(&self) -> usize {
        4 * self.n_1d
    }

    /// Solution point `k` along the given line.
    #[inline]
    pub fn upt_on_line(&self, dir: LineDir, line: usize, k: usize) -> usize {
        match dir {
            LineDir::Xi => k + line * self.n_1d,
            LineDir::Eta => line + k * self.n_1d,
        }
    }

    #[inline]
    pub fn fpt(&self, face: usize, m: usize) -> usize {
        face * self.n_1d + m
    }

    /// Face point index of the low and high ends of a line.
    #[inline]
    pub fn line_ends(&self, dir: LineDir, line: usize) -> (usize, usize) {
        let p = self.n_1d - 1;
        match dir {
            LineDir::Xi => (self.fpt(3, p - line), self.fpt(1, line)),
            LineDir::Eta => (self.fpt(0, line), self.fpt(2, p - line)),
        }
    }

    /// Line and end a face point belongs to.
    #[inline]
    pub fn line_end(&self, face: usize, m: usize) -> LineEnd {
        let p = self.n_1d - 1;
        let (dir, line, high) = match face {
            0 => (LineDir::Eta, m, false),
            1 => (LineDir::Xi, m, true),
            2 => (LineDir::Eta, p - m, true),
            _ => (LineDir::Xi, p - m, false),
        };
        LineEnd { dir, line, high }
    }

    /// Solution point nearest to a face point.
    #[inline]
    pub fn nearest_upt(&self, face: usize, m: usize) -> usize {
        let end = self.line_end(face, m);
        let k = if end.high { self.n_1d - 1 } else { 0 };
        self.upt_on_line(end.dir, end.line, k)
    }

    /// Face point on the neighbour that pairs with point `m`.
    #[inline]
    pub fn paired(&self, m: usize) -> usize {
        self.n_1d - 1 - m
    }
}
