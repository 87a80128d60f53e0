//! Kernel execution backend.
//!
//! This module provides:
//! - Banked buffers owned by a `BufferPool`
//! - The `Kernel` contract and the `(group, name)` kernel table
//! - Execution queues and the multi-queue `Scheduler`

mod buffer;
mod error;
mod kernel;
mod queue;

pub use buffer::{ActiveBanks, BankRole, Binding, Buffer, BufferId, BufferPool, Inputs, KernelMemory};
pub use error::KernelError;
pub use kernel::{Kernel, KernelGroup, KernelTable, LaunchArgs, Progress};
pub use queue::{Invocation, Queue, ScheduleError, Scheduler, SchedulerStats};
