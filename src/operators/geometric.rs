//! Metric terms for affine quadrilateral elements.
//!
//! With a constant Jacobian the physical divergence reduces to
//!
//! ∇·F = ∂(∇ξ·F)/∂ξ + ∂(∇η·F)/∂η
//!
//! so kernels only need the contravariant rows ∇ξ = (ξ_x, ξ_y) and
//! ∇η = (η_x, η_y) of the inverse Jacobian per element. On a face the
//! contravariant flux is the physical normal flux scaled by |∇ξ| (faces 1, 3)
//! or |∇η| (faces 0, 2).

/// Metric terms of one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementMetrics {
    /// ∇ξ = (ξ_x, ξ_y)
    pub grad_xi: (f64, f64),
    /// ∇η = (η_x, η_y)
    pub grad_eta: (f64, f64),
    /// Jacobian determinant x_ξ y_η - x_η y_ξ
    pub det_j: f64,
    /// Outward unit normal per face
    pub normals: [(f64, f64); 4],
    /// |∇ξ| or |∇η| per face: contravariant / physical normal flux ratio
    pub face_scale: [f64; 4],
}

impl ElementMetrics {
    /// Metrics of the quadrilateral with counter-clockwise vertices
    /// v0 (-1,-1), v1 (+1,-1), v2 (+1,+1), v3 (-1,+1).
    ///
    /// For parallelograms the bilinear map is affine and
    /// x_ξ = (x1 - x0 + x2 - x3)/4, x_η = (x3 - x0 + x2 - x1)/4.
    pub fn from_vertices(verts: &[(f64, f64); 4]) -> Self {
        let [(x0, y0), (x1, y1), (x2, y2), (x3, y3)] = *verts;

        let x_r = (x1 - x0 + x2 - x3) / 4.0;
        let x_s = (x3 - x0 + x2 - x1) / 4.0;
        let y_r = (y1 - y0 + y2 - y3) / 4.0;
        let y_s = (y3 - y0 + y2 - y1) / 4.0;
        let det_j = x_r * y_s - x_s * y_r;

        let grad_xi = (y_s / det_j, -x_s / det_j);
        let grad_eta = (-y_r / det_j, x_r / det_j);

        let norm = |(a, b): (f64, f64)| (a * a + b * b).sqrt();
        let mag_xi = norm(grad_xi);
        let mag_eta = norm(grad_eta);
        let unit = |(a, b): (f64, f64), m: f64, sign: f64| (sign * a / m, sign * b / m);

        Self {
            grad_xi,
            grad_eta,
            det_j,
            normals: [
                unit(grad_eta, mag_eta, -1.0),
                unit(grad_xi, mag_xi, 1.0),
                unit(grad_eta, mag_eta, 1.0),
                unit(grad_xi, mag_xi, -1.0),
            ],
            face_scale: [mag_eta, mag_xi, mag_eta, mag_xi],
        }
    }

    /// Reference-direction gradient of the given line direction.
    #[inline]
    pub fn grad(&self, dir: super::LineDir) -> (f64, f64) {
        match dir {
            super::LineDir::Xi => self.grad_xi,
            super::LineDir::Eta => self.grad_eta,
        }
    }

    /// |∇ξ| or |∇η| for a line direction.
    #[inline]
    pub fn grad_norm(&self, dir: super::LineDir) -> f64 {
        match dir {
            super::LineDir::Xi => self.face_scale[1],
            super::LineDir::Eta => self.face_scale[0],
        }
    }
}

/// Bilinear map from reference (r, s) to physical coordinates.
pub fn reference_to_physical(verts: &[(f64, f64); 4], r: f64, s: f64) -> (f64, f64) {
    let shape = [
        (1.0 - r) * (1.0 - s) / 4.0,
        (1.0 + r) * (1.0 - s) / 4.0,
        (1.0 + r) * (1.0 + s) / 4.0,
        (1.0 - r) * (1.0 + s) / 4.0,
    ];
    verts
        .iter()
        .zip(shape)
        .fold((0.0, 0.0), |(x, y), (&(vx, vy), n)| (x + n * vx, y + n * vy))
}
