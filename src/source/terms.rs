//! Source term implementations.

use super::{SourceContext, SourceTerm};
use std::f64::consts::PI;

/// Shape function of a damping ramp.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SpongeProfile {
    /// γ(ξ) = γ_max · ξ
    Linear,
    /// γ(ξ) = γ_max · ξ²
    Quadratic,
    /// γ(ξ) = γ_max · (1 - cos(πξ))/2
    #[default]
    Cosine,
}

impl SpongeProfile {
    /// Profile at normalized depth ξ ∈ [0, 1], returned as γ/γ_max.
    pub fn evaluate(&self, xi: f64) -> f64 {
        let xi = xi.clamp(0.0, 1.0);
        match self {
            SpongeProfile::Linear => xi,
            SpongeProfile::Quadratic => xi * xi,
            SpongeProfile::Cosine => 0.5 * (1.0 - (PI * xi).cos()),
        }
    }
}

/// Relaxation toward a reference state in a layer next to walls.
///
/// S = γ(d) (q_ref - q), with ξ = 1 - d/width so damping peaks at the
/// wall and vanishes at distance `width`.
#[derive(Clone, Debug, PartialEq)]
pub struct WallSponge {
    pub reference: Vec<f64>,
    pub gamma_max: f64,
    pub width: f64,
    pub profile: SpongeProfile,
}

impl WallSponge {
    pub fn new(reference: impl Into<Vec<f64>>, gamma_max: f64, width: f64) -> Self {
        Self {
            reference: reference.into(),
            gamma_max,
            width,
            profile: SpongeProfile::default(),
        }
    }

    pub fn with_profile(mut self, profile: SpongeProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Damping coefficient at wall distance `d`.
    pub fn gamma(&self, d: f64) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        self.gamma_max * self.profile.evaluate(1.0 - d / self.width)
    }
}

impl SourceTerm for WallSponge {
    fn name(&self) -> &'static str {
        "wall_sponge"
    }

    fn needs_wall_distance(&self) -> bool {
        true
    }

    fn evaluate(&self, ctx: &SourceContext<'_>, out: &mut [f64]) {
        let gamma = ctx.wall_distance.map_or(0.0, |d| self.gamma(d));
        for ((o, q), r) in out.iter_mut().zip(ctx.state).zip(&self.reference) {
            *o = gamma * (r - q);
        }
    }
}

/// Spatially uniform, constant forcing.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyForce {
    pub values: Vec<f64>,
}

impl BodyForce {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl SourceTerm for BodyForce {
    fn name(&self) -> &'static str {
        "body_force"
    }

    fn evaluate(&self, _ctx: &SourceContext<'_>, out: &mut [f64]) {
        for (o, v) in out.iter_mut().zip(&self.values) {
            *o = *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_span_unit_interval() {
        for p in [SpongeProfile::Linear, SpongeProfile::Quadratic, SpongeProfile::Cosine] {
            assert!(p.evaluate(0.0).abs() < 1e-14);
            assert!((p.evaluate(1.0) - 1.0).abs() < 1e-14);
            assert_eq!(p.evaluate(-3.0), p.evaluate(0.0));
        }
        assert!((SpongeProfile::Cosine.evaluate(0.5) - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_wall_sponge_relaxes_toward_reference() {
        let sponge = WallSponge::new(vec![1.0, 0.0], 2.0, 1.0).with_profile(SpongeProfile::Linear);
        let state = [0.5, 0.25];
        let mut out = [0.0; 2];

        let ctx = SourceContext {
            time: 0.0,
            position: (0.0, 0.0),
            state: &state,
            wall_distance: Some(0.25),
        };
        sponge.evaluate(&ctx, &mut out);
        // γ = 2 · 0.75
        assert!((out[0] - 0.75).abs() < 1e-14);
        assert!((out[1] + 0.375).abs() < 1e-14);

        let far = SourceContext {
            wall_distance: Some(3.0),
            ..ctx
        };
        sponge.evaluate(&far, &mut out);
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn test_body_force_is_uniform() {
        let force = BodyForce::new(vec![0.0, 1.5]);
        let mut out = [9.0; 2];
        let ctx = SourceContext {
            time: 4.0,
            position: (10.0, -3.0),
            state: &[1.0, 2.0],
            wall_distance: None,
        };
        force.evaluate(&ctx, &mut out);
        assert_eq!(out, [0.0, 1.5]);
        assert!(!force.needs_wall_distance());
    }
}
