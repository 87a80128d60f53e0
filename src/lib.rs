//! # rdfr
//!
//! Right-hand side evaluation for 2D conservation laws discretized with
//! flux reconstruction on quadrilaterals, with residual-distribution shock
//! capturing.
//!
//! This crate provides:
//! - Point sets and the operator matrices of the scheme (interpolation to
//!   extended points, RD and subcell differentiation, residual smoothing)
//! - A kernel/buffer contract with banked buffers and a two-queue scheduler
//!   that overlaps halo exchange with compute
//! - Element and interface kernels for low-order subcell, central and
//!   high-order residual-distribution updates, blended by a residual sensor
//! - Flux models (advection, Euler), Riemann solvers (Rusanov, HLL),
//!   boundary conditions and source terms
//! - In-process partition exchange for domain-decomposed runs
//!
//! The entry point is [`SystemBuilder`]: it builds one [`System`] per
//! partition, and [`System::rhs`] evaluates `-∇·F(u) + S` from one solution
//! bank into another.

pub mod backend;
pub mod basis;
pub mod boundary;
pub mod comm;
pub mod elements;
pub mod equations;
pub mod flux;
pub mod interfaces;
pub mod mesh;
pub mod operators;
pub mod polynomial;
pub mod solver;
pub mod source;

pub use backend::{
    ActiveBanks, Binding, BufferId, BufferPool, Kernel, KernelError, KernelGroup, KernelMemory,
    KernelTable, LaunchArgs, Progress, Queue, Scheduler,
};
pub use boundary::{BoundaryCondition, BoundaryContext, Extrapolate, FixedState, PrescribedState, SlipWall};
pub use comm::{HaloEndpoint, HaloNetwork};
pub use equations::{Advection2D, Euler2D, FluxModel};
pub use flux::RiemannSolver;
pub use mesh::{BoundaryTag, Mesh2D, PartitionMesh};
pub use operators::RdOperators;
pub use polynomial::PointLayout;
pub use solver::{
    AntiAlias, ConfigError, Extension, ExtensionContext, PipelineVariant, RhsError, SetupError,
    ShockCapturing, SolverConfig, SourceExtension, System, SystemBuilder,
};
pub use source::{BodyForce, Geometry, SourceContext, SourceTerm, WallSponge};
