//! Analytic wall-distance profiles for the built-in geometries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance reported where a geometry has no wall.
pub const FAR_FIELD_DISTANCE: f64 = 1.0e8;

/// Geometry tag selecting a wall-distance profile.
///
/// Bodies have unit diameter (or unit side) and sit at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Geometry {
    /// Circle of radius 0.5
    Cylinder,
    /// Axis-aligned unit square
    SquareCylinder,
    /// Two circles of radius 0.5 at x = 0 and x = 10
    TandemSpheres,
    /// Unit square resting on the wall y = 0
    Cube,
    /// Periodic box without walls
    Tgv,
}

impl Geometry {
    pub fn name(self) -> &'static str {
        match self {
            Geometry::Cylinder => "cylinder",
            Geometry::SquareCylinder => "square-cylinder",
            Geometry::TandemSpheres => "tandem-spheres",
            Geometry::Cube => "cube",
            Geometry::Tgv => "tgv",
        }
    }

    /// Distance from (x, y) to the nearest wall, zero on and inside bodies.
    pub fn distance(self, x: f64, y: f64) -> f64 {
        match self {
            Geometry::Cylinder => ((x * x + y * y).sqrt() - 0.5).max(0.0),
            Geometry::SquareCylinder => box_distance(x, y),
            Geometry::TandemSpheres => {
                let front = (x * x + y * y).sqrt();
                let back = ((x - 10.0).powi(2) + y * y).sqrt();
                (front.min(back) - 0.5).max(0.0)
            }
            Geometry::Cube => box_distance(x, y).min(y.max(0.0)),
            Geometry::Tgv => FAR_FIELD_DISTANCE,
        }
    }
}

/// Distance to the unit square centred at the origin.
fn box_distance(x: f64, y: f64) -> f64 {
    let dx = (x.abs() - 0.5).max(0.0);
    let dy = (y.abs() - 0.5).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Geometry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cylinder" => Ok(Geometry::Cylinder),
            "square-cylinder" => Ok(Geometry::SquareCylinder),
            "tandem-spheres" => Ok(Geometry::TandemSpheres),
            "cube" => Ok(Geometry::Cube),
            "tgv" => Ok(Geometry::Tgv),
            other => Err(format!("unknown geometry '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylinder() {
        let g = Geometry::Cylinder;
        assert!(g.distance(0.5, 0.0).abs() < 1e-14);
        assert!((g.distance(0.0, 2.0) - 1.5).abs() < 1e-14);
        assert_eq!(g.distance(0.1, 0.1), 0.0);
    }

    #[test]
    fn test_square_cylinder_corner_and_face() {
        let g = Geometry::SquareCylinder;
        assert!((g.distance(1.5, 0.2) - 1.0).abs() < 1e-14);
        assert!((g.distance(1.5, 1.5) - 2.0_f64.sqrt()).abs() < 1e-14);
    }

    #[test]
    fn test_tandem_spheres_nearest_body() {
        let g = Geometry::TandemSpheres;
        assert!((g.distance(9.0, 0.0) - 0.5).abs() < 1e-14);
        assert!((g.distance(-1.0, 0.0) - 0.5).abs() < 1e-14);
        assert!((g.distance(5.0, 0.0) - 4.5).abs() < 1e-14);
    }

    #[test]
    fn test_cube_sees_floor() {
        let g = Geometry::Cube;
        assert!((g.distance(5.0, 0.25) - 0.25).abs() < 1e-14);
        assert!((g.distance(0.0, 0.75) - 0.25).abs() < 1e-14);
    }

    #[test]
    fn test_tags() {
        assert_eq!("tgv".parse::<Geometry>(), Ok(Geometry::Tgv));
        assert_eq!(Geometry::Tgv.distance(0.0, 0.0), FAR_FIELD_DISTANCE);
        assert!("sphere".parse::<Geometry>().is_err());
        for g in [
            Geometry::Cylinder,
            Geometry::SquareCylinder,
            Geometry::TandemSpheres,
            Geometry::Cube,
            Geometry::Tgv,
        ] {
            assert_eq!(g.to_string().parse::<Geometry>(), Ok(g));
        }
    }
}
