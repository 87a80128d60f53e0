//! 2D compressible Euler equations.
//!
//! Conserved variables u = (ρ, ρu, ρv, E), ideal gas closure
//! p = (γ - 1)(E - ½ρ|v|²).

use super::FluxModel;
use crate::solver::ConfigError;
use std::collections::BTreeMap;

/// 2D Euler equations for an ideal gas.
#[derive(Clone, Debug)]
pub struct Euler2D {
    /// Ratio of specific heats
    pub gamma: f64,
}

impl Euler2D {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    /// Build from the `constants` configuration section (`gamma`).
    pub fn from_constants(constants: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        let gamma = *constants
            .get("gamma")
            .ok_or_else(|| ConfigError::MissingConstant("gamma".into()))?;
        if !(gamma > 1.0 && gamma.is_finite()) {
            return Err(ConfigError::invalid(
                "constants",
                "gamma",
                format!("ratio of specific heats must exceed 1, got {gamma}"),
            ));
        }
        Ok(Self::new(gamma))
    }

    /// Pressure of a conserved state.
    #[inline]
    pub fn pressure(&self, u: &[f64]) -> f64 {
        let [rho, mx, my, e] = [u[0], u[1], u[2], u[3]];
        (self.gamma - 1.0) * (e - 0.5 * (mx * mx + my * my) / rho)
    }

    /// Conserved state from primitive (ρ, u, v, p).
    pub fn conserved(&self, rho: f64, vx: f64, vy: f64, p: f64) -> [f64; 4] {
        [
            rho,
            rho * vx,
            rho * vy,
            p / (self.gamma - 1.0) + 0.5 * rho * (vx * vx + vy * vy),
        ]
    }

    #[inline]
    fn sound_speed(&self, rho: f64, p: f64) -> f64 {
        (self.gamma * p.max(0.0) / rho).sqrt()
    }
}

impl FluxModel for Euler2D {
    fn name(&self) -> &'static str {
        "euler"
    }

    fn n_vars(&self) -> usize {
        4
    }

    fn normal_flux(&self, u: &[f64], dir: (f64, f64), out: &mut [f64]) {
        let rho = u[0];
        let (vx, vy) = (u[1] / rho, u[2] / rho);
        let p = self.pressure(u);
        let vn = vx * dir.0 + vy * dir.1;

        out[0] = rho * vn;
        out[1] = u[1] * vn + p * dir.0;
        out[2] = u[2] * vn + p * dir.1;
        out[3] = (u[3] + p) * vn;
    }

    fn wave_speeds(&self, u: &[f64], n: (f64, f64)) -> (f64, f64) {
        let rho = u[0];
        let vn = (u[1] * n.0 + u[2] * n.1) / rho;
        let c = self.sound_speed(rho, self.pressure(u));
        (vn - c, vn + c)
    }

    fn shock_variable(&self) -> usize {
        0
    }

    fn momentum(&self) -> Option<(usize, usize)> {
        Some((1, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_at_rest_is_pressure_only() {
        let eq = Euler2D::new(1.4);
        let u = eq.conserved(1.2, 0.0, 0.0, 2.0);
        let mut f = [0.0; 4];
        eq.normal_flux(&u, (0.6, 0.8), &mut f);
        assert!(f[0].abs() < 1e-14);
        assert!((f[1] - 2.0 * 0.6).abs() < 1e-14);
        assert!((f[2] - 2.0 * 0.8).abs() < 1e-14);
        assert!(f[3].abs() < 1e-14);
    }

    #[test]
    fn test_flux_is_linear_in_direction() {
        let eq = Euler2D::new(1.4);
        let u = eq.conserved(0.9, 1.5, -0.3, 1.1);
        let (mut fx, mut fy, mut fd) = ([0.0; 4], [0.0; 4], [0.0; 4]);
        eq.normal_flux(&u, (1.0, 0.0), &mut fx);
        eq.normal_flux(&u, (0.0, 1.0), &mut fy);
        eq.normal_flux(&u, (2.0, -3.0), &mut fd);
        for v in 0..4 {
            assert!((fd[v] - (2.0 * fx[v] - 3.0 * fy[v])).abs() < 1e-12);
        }
    }

    #[test]
    fn test_wave_speeds() {
        let eq = Euler2D::new(1.4);
        let u = eq.conserved(1.0, 2.0, 0.0, 1.0);
        let c = 1.4_f64.sqrt();
        let (lo, hi) = eq.wave_speeds(&u, (1.0, 0.0));
        assert!((lo - (2.0 - c)).abs() < 1e-12);
        assert!((hi - (2.0 + c)).abs() < 1e-12);
        assert!((eq.max_wave_speed(&u, (-1.0, 0.0)) - (2.0 + c)).abs() < 1e-12);
    }

    #[test]
    fn test_from_constants() {
        let mut c = BTreeMap::new();
        assert!(matches!(
            Euler2D::from_constants(&c),
            Err(ConfigError::MissingConstant(_))
        ));
        c.insert("gamma".to_string(), 0.9);
        assert!(Euler2D::from_constants(&c).is_err());
        c.insert("gamma".to_string(), 1.4);
        assert!((Euler2D::from_constants(&c).unwrap().gamma - 1.4).abs() < 1e-15);
    }
}
