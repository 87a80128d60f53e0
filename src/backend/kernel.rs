//! Kernel contract and the kernel table.
//!
//! A kernel is an opaque unit of work bound at construction to its buffers
//! and constants. It reads only its declared inputs and writes only its
//! declared outputs; the scheduler relies on that to interleave queues.

use super::buffer::KernelMemory;
use super::error::KernelError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of a non-blocking kernel attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// The invocation completed.
    Done,
    /// Waiting on an external event; no buffer was touched.
    Pending,
}

/// Arguments bound when an invocation is enqueued.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LaunchArgs {
    /// Simulation time, for time-dependent kernels
    pub time: Option<f64>,
}

impl LaunchArgs {
    pub fn at(time: f64) -> Self {
        Self { time: Some(time) }
    }

    pub fn time_or_zero(&self) -> f64 {
        self.time.unwrap_or(0.0)
    }
}

/// A unit of computation executed by the scheduler.
pub trait Kernel: Send + Sync {
    fn name(&self) -> &str;

    /// Attempt the invocation without blocking.
    fn run(&self, mem: &mut KernelMemory<'_>, args: &LaunchArgs) -> Result<Progress, KernelError>;

    /// Complete the invocation, blocking if needed.
    fn wait(&self, mem: &mut KernelMemory<'_>, args: &LaunchArgs) -> Result<(), KernelError> {
        loop {
            if self.run(mem, args)? == Progress::Done {
                return Ok(());
            }
            std::thread::yield_now();
        }
    }
}

impl fmt::Debug for dyn Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kernel({})", self.name())
    }
}

/// Owner group of a kernel slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KernelGroup {
    /// `eles`
    Elements,
    /// `iint`
    InteriorInterfaces,
    /// `bcint`
    BoundaryInterfaces,
    /// `mpiint`
    MpiInterfaces,
}

impl KernelGroup {
    pub fn short_name(self) -> &'static str {
        match self {
            KernelGroup::Elements => "eles",
            KernelGroup::InteriorInterfaces => "iint",
            KernelGroup::BoundaryInterfaces => "bcint",
            KernelGroup::MpiInterfaces => "mpiint",
        }
    }
}

impl fmt::Display for KernelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Registry of kernels keyed by `(group, name)`.
///
/// A slot holds every kernel registered under the key, in registration
/// order (e.g. one per boundary condition or per neighbouring partition).
/// Enqueuing a slot enqueues all of them.
#[derive(Default, Clone)]
pub struct KernelTable {
    slots: BTreeMap<(KernelGroup, &'static str), Vec<Arc<dyn Kernel>>>,
}

impl KernelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, group: KernelGroup, name: &'static str, kernel: Arc<dyn Kernel>) {
        self.slots.entry((group, name)).or_default().push(kernel);
    }

    /// True when at least one kernel is registered under the key.
    pub fn contains(&self, group: KernelGroup, name: &'static str) -> bool {
        self.slot(group, name).is_some_and(|s| !s.is_empty())
    }

    pub fn slot(&self, group: KernelGroup, name: &'static str) -> Option<&[Arc<dyn Kernel>]> {
        self.slots.get(&(group, name)).map(Vec::as_slice)
    }

    /// Remove a slot, returning its kernels.
    pub fn remove(&mut self, group: KernelGroup, name: &'static str) -> Option<Vec<Arc<dyn Kernel>>> {
        self.slots.remove(&(group, name))
    }

    /// Registered keys, sorted by group then name.
    pub fn keys(&self) -> impl Iterator<Item = (KernelGroup, &'static str)> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for KernelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|((g, n), v)| format!("{g}/{n} x{}", v.len())))
            .finish()
    }
}
