//! Boundary tags for mesh edges.
//!
//! Every physical boundary edge carries a tag; the system maps tags to
//! boundary conditions at setup.

use std::fmt;

/// Tag identifying the kind of a boundary edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundaryTag {
    /// Impermeable wall
    #[default]
    Wall,
    /// Prescribed inflow state
    Inflow,
    /// Supersonic / extrapolated outflow
    Outflow,
    /// Far-field state
    FarField,
    /// User-defined group
    Custom(u32),
}

impl BoundaryTag {
    pub fn is_wall(&self) -> bool {
        matches!(self, BoundaryTag::Wall)
    }
}

impl fmt::Display for BoundaryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryTag::Wall => f.write_str("wall"),
            BoundaryTag::Inflow => f.write_str("inflow"),
            BoundaryTag::Outflow => f.write_str("outflow"),
            BoundaryTag::FarField => f.write_str("far-field"),
            BoundaryTag::Custom(id) => write!(f, "custom-{id}"),
        }
    }
}
