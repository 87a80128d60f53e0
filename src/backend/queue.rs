//! Execution queues and the multi-queue scheduler.
//!
//! `run_all` is a full barrier over the queues it is given:
//! 1. Invocations of one queue run in enqueue order
//! 2. Queues are swept round-robin, one head per queue per sweep, so a
//!    pending communication head never holds back compute on another queue
//! 3. When every head is pending the scheduler blocks on the first one
//! 4. It returns once every queue is empty
//!
//! The first kernel error aborts the barrier. All supplied queues are
//! drained and the error is returned; nothing is retried.

use super::buffer::KernelMemory;
use super::error::KernelError;
use super::kernel::{Kernel, LaunchArgs, Progress};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{trace, trace_span};

/// One enqueued kernel call.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub kernel: Arc<dyn Kernel>,
    pub args: LaunchArgs,
}

/// An ordered list of kernel invocations.
#[derive(Debug)]
pub struct Queue {
    label: &'static str,
    pending: VecDeque<Invocation>,
}

impl Queue {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            pending: VecDeque::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Append an invocation; nothing runs until the queue is scheduled.
    pub fn enqueue(&mut self, kernel: Arc<dyn Kernel>, args: LaunchArgs) {
        self.pending.push_back(Invocation { kernel, args });
    }

    /// Append every kernel of a slot with the same arguments.
    pub fn enqueue_all(&mut self, kernels: &[Arc<dyn Kernel>], args: LaunchArgs) {
        for k in kernels {
            self.enqueue(Arc::clone(k), args);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Kernel names in execution order.
    pub fn names(&self) -> Vec<String> {
        self.pending.iter().map(|i| i.kernel.name().to_string()).collect()
    }
}

/// Fatal failure inside a barrier.
#[derive(Error, Debug)]
#[error("kernel '{kernel}' on queue '{queue}' failed: {source}")]
pub struct ScheduleError {
    pub kernel: String,
    pub queue: &'static str,
    #[source]
    pub source: KernelError,
}

/// Counters accumulated over every barrier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub barriers: u64,
    pub invocations: u64,
    pub pending_polls: u64,
    pub blocking_waits: u64,
}

/// Drives queues against the memory of one residual evaluation.
#[derive(Debug, Default)]
pub struct Scheduler {
    stats: SchedulerStats,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run every queue to completion.
    pub fn run_all(
        &mut self,
        queues: &mut [&mut Queue],
        mem: &mut KernelMemory<'_>,
    ) -> Result<(), ScheduleError> {
        let _span = trace_span!("run_all", queues = queues.len()).entered();
        self.stats.barriers += 1;

        let outcome = self.drive(queues, mem);
        if outcome.is_err() {
            for q in queues.iter_mut() {
                q.clear();
            }
        }
        outcome
    }

    fn drive(
        &mut self,
        queues: &mut [&mut Queue],
        mem: &mut KernelMemory<'_>,
    ) -> Result<(), ScheduleError> {
        loop {
            let mut active = false;
            let mut progressed = false;

            for q in queues.iter_mut() {
                let Some(inv) = q.pending.front() else {
                    continue;
                };
                active = true;
                trace!(queue = q.label, kernel = inv.kernel.name(), "run");

                let progress = inv.kernel.run(mem, &inv.args).map_err(|e| fault(q, inv, e))?;
                match progress {
                    Progress::Done => {
                        q.pending.pop_front();
                        self.stats.invocations += 1;
                        progressed = true;
                    }
                    Progress::Pending => self.stats.pending_polls += 1,
                }
            }

            if !active {
                return Ok(());
            }
            if progressed {
                continue;
            }

            // Every head is waiting: block on the first one
            if let Some(q) = queues.iter_mut().find(|q| !q.is_empty()) {
                if let Some(inv) = q.pending.front() {
                    trace!(queue = q.label, kernel = inv.kernel.name(), "wait");
                    inv.kernel.wait(mem, &inv.args).map_err(|e| fault(q, inv, e))?;
                    q.pending.pop_front();
                    self.stats.invocations += 1;
                    self.stats.blocking_waits += 1;
                }
            }
        }
    }
}

fn fault(q: &Queue, inv: &Invocation, source: KernelError) -> ScheduleError {
    ScheduleError {
        kernel: inv.kernel.name().to_string(),
        queue: q.label,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActiveBanks, Binding, BufferPool};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Appends a tag to a shared log and writes `value` into slot `idx`.
    struct Record {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        out: Binding,
        idx: usize,
        value: f64,
    }

    impl Kernel for Record {
        fn name(&self) -> &str {
            self.tag
        }

        fn run(&self, mem: &mut KernelMemory<'_>, _: &LaunchArgs) -> Result<Progress, KernelError> {
            if let Ok(mut log) = self.log.lock() {
                log.push(self.tag);
            }
            mem.write(self.out)?[self.idx] = self.value;
            Ok(Progress::Done)
        }
    }

    /// Pending for the first `polls` attempts.
    struct Late {
        remaining: AtomicUsize,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Kernel for Late {
        fn name(&self) -> &str {
            "late"
        }

        fn run(&self, _: &mut KernelMemory<'_>, _: &LaunchArgs) -> Result<Progress, KernelError> {
            let left = self.remaining.load(Ordering::SeqCst);
            if left > 0 {
                self.remaining.store(left - 1, Ordering::SeqCst);
                return Ok(Progress::Pending);
            }
            if let Ok(mut log) = self.log.lock() {
                log.push("late");
            }
            Ok(Progress::Done)
        }
    }

    struct Fails;

    impl Kernel for Fails {
        fn name(&self) -> &str {
            "fails"
        }

        fn run(&self, _: &mut KernelMemory<'_>, _: &LaunchArgs) -> Result<Progress, KernelError> {
            Err(KernelError::NotImplemented("fails"))
        }
    }

    fn record(
        tag: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
        out: Binding,
        idx: usize,
    ) -> Arc<dyn Kernel> {
        Arc::new(Record {
            tag,
            log: Arc::clone(log),
            out,
            idx,
            value: idx as f64 + 1.0,
        })
    }

    #[test]
    fn test_fifo_within_queue_and_interleave_across() {
        let mut pool = BufferPool::new();
        let buf = pool.allocate("buf", [1, 4, 1], 1);
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut q1 = Queue::new("compute");
        let mut q2 = Queue::new("comm");
        q1.enqueue(record("a1", &log, buf.plain(), 0), LaunchArgs::default());
        q1.enqueue(record("a2", &log, buf.plain(), 1), LaunchArgs::default());
        q1.enqueue(record("a3", &log, buf.plain(), 2), LaunchArgs::default());
        q2.enqueue(
            Arc::new(Late {
                remaining: AtomicUsize::new(1),
                log: Arc::clone(&log),
            }),
            LaunchArgs::default(),
        );
        q2.enqueue(record("b1", &log, buf.plain(), 3), LaunchArgs::default());

        let mut sched = Scheduler::new();
        let mut mem = pool.memory(ActiveBanks::default());
        sched.run_all(&mut [&mut q1, &mut q2], &mut mem).unwrap();
        assert!(q1.is_empty() && q2.is_empty());

        let log = log.lock().unwrap().clone();
        // Compute proceeds while the comm head is pending
        assert_eq!(log, vec!["a1", "a2", "late", "a3", "b1"]);
        assert_eq!(mem.read(buf.plain()).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(sched.stats().invocations, 5);
        assert_eq!(sched.stats().pending_polls, 1);
    }

    #[test]
    fn test_blocks_when_all_heads_pending() {
        let mut pool = BufferPool::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut q = Queue::new("comm");
        q.enqueue(
            Arc::new(Late {
                remaining: AtomicUsize::new(3),
                log: Arc::clone(&log),
            }),
            LaunchArgs::default(),
        );
        let mut sched = Scheduler::new();
        sched
            .run_all(&mut [&mut q], &mut pool.memory(ActiveBanks::default()))
            .unwrap();
        assert_eq!(sched.stats().blocking_waits, 1);
        assert_eq!(log.lock().unwrap().as_slice(), &["late"]);
    }

    #[test]
    fn test_empty_queue_does_not_change_results() {
        let run = |with_empty: bool| {
            let mut pool = BufferPool::new();
            let buf = pool.allocate("buf", [1, 3, 1], 1);
            let log = Arc::new(Mutex::new(Vec::new()));
            let mut q1 = Queue::new("compute");
            for i in 0..3 {
                q1.enqueue(record("k", &log, buf.plain(), i), LaunchArgs::default());
            }
            let mut q2 = Queue::new("comm");
            let mut sched = Scheduler::new();
            let mut mem = pool.memory(ActiveBanks::default());
            if with_empty {
                sched.run_all(&mut [&mut q1, &mut q2], &mut mem).unwrap();
            } else {
                sched.run_all(&mut [&mut q1], &mut mem).unwrap();
            }
            pool.bank(buf, 0).unwrap().to_vec()
        };
        let a = run(false);
        let b = run(true);
        assert_eq!(
            a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_error_drains_every_queue() {
        let mut pool = BufferPool::new();
        let buf = pool.allocate("buf", [1, 2, 1], 1);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut q1 = Queue::new("compute");
        let mut q2 = Queue::new("comm");
        q1.enqueue(Arc::new(Fails), LaunchArgs::default());
        q1.enqueue(record("never", &log, buf.plain(), 0), LaunchArgs::default());
        q2.enqueue(
            Arc::new(Late {
                remaining: AtomicUsize::new(10),
                log: Arc::clone(&log),
            }),
            LaunchArgs::default(),
        );

        let mut sched = Scheduler::new();
        let err = sched
            .run_all(&mut [&mut q1, &mut q2], &mut pool.memory(ActiveBanks::default()))
            .unwrap_err();
        assert_eq!(err.kernel, "fails");
        assert_eq!(err.queue, "compute");
        assert!(q1.is_empty() && q2.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }
}
