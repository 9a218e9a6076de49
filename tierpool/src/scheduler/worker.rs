//! # Worker Thread Implementation
//!
//! Each worker is a long-lived OS thread running the same loop against the
//! shared [`SchedulingQueue`](super::queue::SchedulingQueue):
//!
//! 1. Take the scheduling lock and apply the dequeue rule
//! 2. Nothing eligible: park on `not_empty` (or exit during shutdown)
//! 3. Otherwise mark the task in flight, release the lock, and run it
//! 4. Re-acquire the lock, clear the in-flight mark, repeat
//!
//! Tasks run to completion; there is no preemption and no timeout. Panics
//! are caught so the in-flight bookkeeping always completes, then handled
//! according to the pool's [`FaultPolicy`].

use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::MutexGuard;
use tracing::{debug, error, warn};

use crate::config::FaultPolicy;
use crate::{log_error, log_lifecycle};
use super::fault::{panic_message, TaskFault};
use super::pool::PoolShared;
use super::queue::QueuedTask;

/// One thread of the fixed worker set.
pub(crate) struct Worker {
    /// Position in the pool, used for the thread name
    index: usize,

    /// Thread name, `<prefix>-<index>`
    name: String,

    /// State shared with the controller and the other workers
    shared: Arc<PoolShared>,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}

/// Decrements the live-worker count when the thread exits, including by
/// unwinding.
struct LiveWorker<'a>(&'a AtomicUsize);

impl Drop for LiveWorker<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Worker {
    pub fn new(index: usize, shared: Arc<PoolShared>) -> Self {
        let name = format!("{}-{}", shared.config.thread_name_prefix, index);
        Self { index, name, shared }
    }

    /// Starts the worker on its own named thread.
    ///
    /// The caller's tracing dispatcher is installed on the new thread so
    /// worker logs go wherever the pool's creator sends its own.
    pub fn spawn(self, dispatch: tracing::Dispatch) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let _dispatch = tracing::dispatcher::set_default(&dispatch);
                self.run_loop();
            })
    }

    fn run_loop(&self) {
        let _live = LiveWorker(&self.shared.live_workers);
        log_lifecycle!("worker", self.name.as_str(), "started");

        let queue = &self.shared.queue;
        let mut state = queue.lock();
        loop {
            let stop_requested = !self.shared.is_accepting();
            let Some(job) = queue.dequeue(&mut state, stop_requested) else {
                if state.shutdown {
                    break;
                }
                queue.wait_for_work(&mut state);
                continue;
            };

            state.in_flight += 1;
            let outcome = MutexGuard::unlocked(&mut state, || self.execute(job));
            state.in_flight -= 1;

            if let Err(payload) = outcome {
                if !self.shared.is_accepting() {
                    queue.raise_gate_if_idle(&mut state);
                }
                drop(state);
                error!(worker = %self.name, "worker terminating after task panic");
                panic::resume_unwind(payload);
            }
        }
        drop(state);

        log_lifecycle!("worker", self.name.as_str(), "stopped");
    }

    /// Runs one task outside the lock.
    ///
    /// Returns the panic payload only when the fault must propagate.
    fn execute(&self, job: QueuedTask) -> Result<(), Box<dyn Any + Send>> {
        let QueuedTask { id, priority, task } = job;
        let span = crate::task_span!(id, priority);
        let _enter = span.enter();

        debug!(worker = %self.name, "task started");
        let started = Instant::now();

        match panic::catch_unwind(AssertUnwindSafe(move || task.execute())) {
            Ok(()) => {
                self.shared.completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    worker = %self.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "task finished"
                );
                Ok(())
            }
            Err(payload) => {
                self.shared.faulted.fetch_add(1, Ordering::Relaxed);
                let fault = TaskFault {
                    task_id: id,
                    priority,
                    worker: self.name.clone(),
                    message: panic_message(payload.as_ref()),
                };
                log_error!(fault, worker = %self.name);
                self.report(fault);

                match self.shared.config.fault_policy {
                    FaultPolicy::Isolate => Ok(()),
                    FaultPolicy::Propagate => Err(payload),
                }
            }
        }
    }

    fn report(&self, fault: TaskFault) {
        if let Err(flume::TrySendError::Full(fault)) = self.shared.fault_tx.try_send(fault) {
            warn!(task_id = %fault.task_id, "fault report channel full, dropping report");
        }
    }
}
