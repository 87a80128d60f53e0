//! Solver configuration.
//!
//! Options are grouped in sections named like the ini-style files the
//! scheme is usually driven from:
//!
//! ```json
//! {
//!   "solver": { "order": 3, "shock-capturing": "riemann-difference" },
//!   "solver-interfaces": { "riemann-solver": "hll" },
//!   "solver-riemann-difference": { "e_max": 0.5 },
//!   "constants": { "gamma": 1.4 }
//! }
//! ```
//!
//! Every field has a default, so sections and keys may be omitted. The
//! configuration is checked once by [`SolverConfig::validate`]; nothing is
//! re-checked per residual evaluation.

use super::error::ConfigError;
use crate::elements::ElementKernelOptions;
use crate::flux::RiemannSolver;
use crate::polynomial::PointLayout;
use crate::source::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Value of `solver.shock-capturing`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShockCapturing {
    #[default]
    None,
    RiemannDifference,
}

/// Value of `solver.anti-alias`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AntiAlias {
    #[default]
    None,
    /// Assemble the divergence at quadrature points
    DivFlux,
}

/// Stage sequence run by `System::rhs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineVariant {
    /// Low-order subcell update blended with residual distribution
    RdBlended,
    /// Upwind subcell update only; the sensor still runs as a diagnostic
    LowOrder,
    /// Central subcell update only
    LowOrderCentered,
    /// Residual distribution with high-order face values only
    HighOrder,
}

impl ShockCapturing {
    pub const ALL: [Self; 2] = [Self::None, Self::RiemannDifference];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RiemannDifference => "riemann-difference",
        }
    }
}

impl AntiAlias {
    pub const ALL: [Self; 2] = [Self::None, Self::DivFlux];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DivFlux => "div-flux",
        }
    }
}

impl PipelineVariant {
    pub const ALL: [Self; 4] = [
        Self::RdBlended,
        Self::LowOrder,
        Self::LowOrderCentered,
        Self::HighOrder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RdBlended => "rd-blended",
            Self::LowOrder => "low-order",
            Self::LowOrderCentered => "low-order-centered",
            Self::HighOrder => "high-order",
        }
    }

    /// Whether the variant runs the residual sensor.
    pub fn uses_sensor(self) -> bool {
        matches!(self, Self::RdBlended | Self::LowOrder)
    }
}

fn parse_option<T: Copy>(all: &[T], name: impl Fn(T) -> &'static str, s: &str, what: &str) -> Result<T, String> {
    all.iter()
        .copied()
        .find(|v| name(*v) == s)
        .ok_or_else(|| format!("unknown {what} '{s}'"))
}

impl FromStr for ShockCapturing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_option(&Self::ALL, Self::name, s, "shock-capturing scheme")
    }
}

impl FromStr for AntiAlias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_option(&Self::ALL, Self::name, s, "anti-alias mode")
    }
}

impl FromStr for PipelineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_option(&Self::ALL, Self::name, s, "pipeline")
    }
}

impl fmt::Display for ShockCapturing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for AntiAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `[solver]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SolverSection {
    /// Polynomial order p
    pub order: usize,
    pub solution_points: PointLayout,
    pub shock_capturing: ShockCapturing,
    /// Overrides the variant implied by `shock-capturing`
    pub pipeline: Option<PipelineVariant>,
    pub anti_alias: AntiAlias,
    /// Body tag for wall-distance dependent sources
    pub geometry: Option<String>,
    /// Banks of the solution buffer
    pub banks: usize,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            order: 1,
            solution_points: PointLayout::default(),
            shock_capturing: ShockCapturing::default(),
            pipeline: None,
            anti_alias: AntiAlias::default(),
            geometry: None,
            banks: 2,
        }
    }
}

/// `[solver-interfaces]`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct InterfacesSection {
    pub riemann_solver: RiemannSolver,
}

/// `[solver-riemann-difference]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiemannDifferenceSection {
    /// Sensor threshold: α saturates at 1 once the normalized residual reaches it
    pub e_max: f64,
    /// Fixed blend coefficient replacing the sensor output
    #[serde(default)]
    pub alpha: Option<f64>,
}

/// Complete solver configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub solver: SolverSection,
    #[serde(rename = "solver-interfaces")]
    pub interfaces: InterfacesSection,
    #[serde(rename = "solver-riemann-difference")]
    pub riemann_difference: Option<RiemannDifferenceSection>,
    /// Named physical constants
    pub constants: BTreeMap<String, f64>,
}

impl SolverConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Set the polynomial order.
    pub fn with_order(mut self, order: usize) -> Self {
        self.solver.order = order;
        self
    }

    /// Set the solution point layout.
    pub fn with_solution_points(mut self, layout: PointLayout) -> Self {
        self.solver.solution_points = layout;
        self
    }

    /// Enable residual-difference shock capturing with threshold `e_max`.
    ///
    /// # Example
    /// ```ignore
    /// let config = SolverConfig::default()
    ///     .with_order(3)
    ///     .with_riemann_difference(0.5)
    ///     .with_fixed_alpha(1.0); // pure low-order update
    /// ```
    pub fn with_riemann_difference(mut self, e_max: f64) -> Self {
        self.solver.shock_capturing = ShockCapturing::RiemannDifference;
        let alpha = self.riemann_difference.take().and_then(|s| s.alpha);
        self.riemann_difference = Some(RiemannDifferenceSection { e_max, alpha });
        self
    }

    /// Fix the blend coefficient. Requires `with_riemann_difference` first.
    pub fn with_fixed_alpha(mut self, alpha: f64) -> Self {
        if let Some(section) = self.riemann_difference.as_mut() {
            section.alpha = Some(alpha);
        }
        self
    }

    /// Override the pipeline variant.
    pub fn with_pipeline(mut self, variant: PipelineVariant) -> Self {
        self.solver.pipeline = Some(variant);
        self
    }

    pub fn with_anti_alias(mut self, mode: AntiAlias) -> Self {
        self.solver.anti_alias = mode;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.solver.geometry = Some(geometry.name().to_string());
        self
    }

    pub fn with_banks(mut self, banks: usize) -> Self {
        self.solver.banks = banks;
        self
    }

    pub fn with_riemann_solver(mut self, rs: RiemannSolver) -> Self {
        self.interfaces.riemann_solver = rs;
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    /// Check ranges and cross-option consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.order < 1 {
            return Err(ConfigError::invalid("solver", "order", "must be at least 1"));
        }
        if self.solver.banks < 1 {
            return Err(ConfigError::invalid("solver", "banks", "must be at least 1"));
        }

        match (self.solver.shock_capturing, &self.riemann_difference) {
            (ShockCapturing::RiemannDifference, None) => {
                return Err(ConfigError::MissingOption {
                    section: "solver-riemann-difference",
                    key: "e_max",
                });
            }
            (_, Some(rd)) => {
                if !(rd.e_max.is_finite() && rd.e_max > 0.0) {
                    return Err(ConfigError::invalid(
                        "solver-riemann-difference",
                        "e_max",
                        format!("must be positive, got {}", rd.e_max),
                    ));
                }
                if let Some(a) = rd.alpha {
                    if !(0.0..=1.0).contains(&a) {
                        return Err(ConfigError::invalid(
                            "solver-riemann-difference",
                            "alpha",
                            format!("must lie in [0, 1], got {a}"),
                        ));
                    }
                }
            }
            (ShockCapturing::None, None) => {}
        }

        let variant = self.variant();
        if variant.uses_sensor() && self.solver.shock_capturing != ShockCapturing::RiemannDifference {
            return Err(ConfigError::invalid(
                "solver",
                "pipeline",
                format!("'{variant}' requires shock-capturing = riemann-difference"),
            ));
        }

        self.geometry()?;
        Ok(())
    }

    /// The pipeline variant, explicit or implied by `shock-capturing`.
    pub fn variant(&self) -> PipelineVariant {
        self.solver.pipeline.unwrap_or(match self.solver.shock_capturing {
            ShockCapturing::RiemannDifference => PipelineVariant::RdBlended,
            ShockCapturing::None => PipelineVariant::HighOrder,
        })
    }

    /// The configured body geometry, if any.
    pub fn geometry(&self) -> Result<Option<Geometry>, ConfigError> {
        self.solver
            .geometry
            .as_deref()
            .map(|g| g.parse().map_err(|_| ConfigError::UnsupportedGeometry(g.to_string())))
            .transpose()
    }

    /// Element kernels implied by this configuration.
    pub fn element_options(&self) -> ElementKernelOptions {
        let sensor = self
            .riemann_difference
            .as_ref()
            .filter(|_| self.solver.shock_capturing == ShockCapturing::RiemannDifference);
        ElementKernelOptions {
            riemann_solver: self.interfaces.riemann_solver,
            e_max: sensor.map(|s| s.e_max),
            fixed_alpha: sensor.and_then(|s| s.alpha),
            anti_alias: self.solver.anti_alias == AntiAlias::DivFlux,
        }
    }
}
