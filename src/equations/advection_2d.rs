//! 2D scalar advection equation.
//!
//! ∂u/∂t + ∇ · (a u) = 0
//!
//! where a = (a_x, a_y) is the constant advection velocity vector.

use super::FluxModel;

/// 2D linear advection equation.
#[derive(Clone, Debug)]
pub struct Advection2D {
    /// Advection velocity in x-direction
    pub velocity_x: f64,
    /// Advection velocity in y-direction
    pub velocity_y: f64,
}

impl Advection2D {
    pub fn new(velocity_x: f64, velocity_y: f64) -> Self {
        Self {
            velocity_x,
            velocity_y,
        }
    }

    /// Velocity given as (speed, angle), angle counter-clockwise from +x.
    pub fn from_polar(speed: f64, angle: f64) -> Self {
        Self::new(speed * angle.cos(), speed * angle.sin())
    }

    #[inline]
    fn normal_velocity(&self, dir: (f64, f64)) -> f64 {
        self.velocity_x * dir.0 + self.velocity_y * dir.1
    }
}

impl FluxModel for Advection2D {
    fn name(&self) -> &'static str {
        "advection"
    }

    fn n_vars(&self) -> usize {
        1
    }

    fn normal_flux(&self, u: &[f64], dir: (f64, f64), out: &mut [f64]) {
        out[0] = self.normal_velocity(dir) * u[0];
    }

    fn wave_speeds(&self, _u: &[f64], n: (f64, f64)) -> (f64, f64) {
        let a = self.normal_velocity(n);
        (a, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_flux() {
        let eq = Advection2D::new(2.0, -1.0);
        let mut f = [0.0];
        eq.normal_flux(&[3.0], (1.0, 0.0), &mut f);
        assert!((f[0] - 6.0).abs() < 1e-14);
        eq.normal_flux(&[3.0], (0.5, 2.0), &mut f);
        assert!((f[0] - (0.5 * 6.0 - 2.0 * 3.0)).abs() < 1e-14);
    }

    #[test]
    fn test_polar_velocity() {
        let eq = Advection2D::from_polar(2.0, std::f64::consts::FRAC_PI_2);
        assert!(eq.velocity_x.abs() < 1e-14);
        assert!((eq.velocity_y - 2.0).abs() < 1e-14);
        assert!((eq.max_wave_speed(&[1.0], (0.0, -1.0)) - 2.0).abs() < 1e-14);
    }
}
