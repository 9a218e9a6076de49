use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use parking_lot::Mutex;
use tracing::{debug, warn};

use tierpool_api::{BoxedTask, Priority, Task, TaskId};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::logging;
use crate::{log_lifecycle, log_scheduler};
use super::fault::TaskFault;
use super::queue::{QueueSnapshot, QueuedTask, SchedulingQueue};
use super::worker::Worker;
use super::TaskScheduler;

/// Admission state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Submissions are enqueued
    Accepting,
    /// Submissions are rejected while the backlog drains
    Draining,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Accepting => f.write_str("accepting"),
            PoolState::Draining => f.write_str("draining"),
        }
    }
}

/// Outcome of a submission.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The task was queued under this id
    Accepted(TaskId),
    /// The pool is draining; the task was dropped without running
    Rejected,
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }

    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Admission::Accepted(id) => Some(*id),
            Admission::Rejected => None,
        }
    }
}

/// Metrics about the pool state
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Number of worker threads the pool was built with
    pub worker_count: usize,

    /// Worker threads still running
    pub live_workers: usize,

    pub state: PoolState,

    /// Queue lengths, in-flight count and run counter
    pub queue: QueueSnapshot,

    /// Tasks that ran to completion
    pub completed: u64,

    /// Tasks that panicked
    pub faulted: u64,
}

/// State shared between the controller and its workers.
pub(crate) struct PoolShared {
    pub(crate) queue: SchedulingQueue,

    /// Admission flag. Read without the queue lock on the submit path; a
    /// submission racing a stop may still be admitted and is then drained.
    accepting: AtomicBool,

    pub(crate) config: PoolConfig,

    pub(crate) fault_tx: flume::Sender<TaskFault>,

    pub(crate) completed: AtomicU64,

    pub(crate) faulted: AtomicU64,

    pub(crate) live_workers: AtomicUsize,
}

impl PoolShared {
    pub(crate) fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Relaxed)
    }

    /// Closes admission and waits for the drain gate.
    ///
    /// The gate is re-armed under the queue lock before admission closes, so
    /// a gate raised by an earlier stop never satisfies this one. Returns
    /// `false` if `deadline` passed first.
    fn stop(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.queue.lock();
        self.queue.rearm_gate(&mut state);
        self.accepting.store(false, Ordering::SeqCst);
        log_lifecycle!("pool", self.config.thread_name_prefix.as_str(), "stop requested",
            queued = state.tiers.len(), in_flight = state.in_flight);

        self.queue.raise_gate_if_idle(&mut state);
        self.queue.wake_all();

        let drained = match deadline {
            None => {
                self.queue.wait_drained(&mut state);
                true
            }
            Some(deadline) => self.queue.wait_drained_until(&mut state, deadline),
        };
        if drained {
            log_lifecycle!("pool", self.config.thread_name_prefix.as_str(), "drained");
        }
        drained
    }
}

/// Fixed-size worker pool with three-tier priority scheduling.
///
/// Worker threads are started by the constructor and never resized. The pool
/// moves between two states: [`PoolState::Accepting`] and, after
/// [`stop`](Self::stop), [`PoolState::Draining`] until [`resume`](Self::resume).
///
/// # Worker Thread Behavior
/// 1. Park until some tier has work
/// 2. Dequeue under the anti-starvation rule
/// 3. Run the task synchronously
/// 4. Repeat
///
/// Dropping the pool asks the workers to exit once the queue is empty but
/// does not wait for them; use [`shutdown`](Self::shutdown) to join.
pub struct ThreadPool {
    shared: Arc<PoolShared>,

    /// Join handles, taken by `shutdown`
    workers: Mutex<Vec<JoinHandle<()>>>,

    fault_rx: flume::Receiver<TaskFault>,
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("worker_count", &self.worker_count())
            .field("state", &self.state())
            .field("queue", &self.shared.queue)
            .finish()
    }
}

impl ThreadPool {
    /// Starts a pool of `worker_count` threads with default settings.
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::new(worker_count))
    }

    /// Starts a pool from an explicit configuration.
    ///
    /// The configuration is validated before any thread starts. If a thread
    /// cannot be spawned, the workers already started are shut down and
    /// joined before the error is returned.
    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let (fault_tx, fault_rx) = flume::bounded(config.fault_report_capacity);
        let worker_count = config.worker_count;
        let shared = Arc::new(PoolShared {
            queue: SchedulingQueue::new(config.starvation_threshold),
            accepting: AtomicBool::new(true),
            config,
            fault_tx,
            completed: AtomicU64::new(0),
            faulted: AtomicU64::new(0),
            live_workers: AtomicUsize::new(0),
        });

        let dispatch = logging::current_subscriber();
        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            shared.live_workers.fetch_add(1, Ordering::SeqCst);
            match Worker::new(index, Arc::clone(&shared)).spawn(dispatch.clone()) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    shared.live_workers.fetch_sub(1, Ordering::SeqCst);
                    shared.queue.request_shutdown();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(PoolError::ThreadSpawn(format!(
                        "failed to spawn worker {index}: {e}"
                    )));
                }
            }
        }

        log_lifecycle!("pool", shared.config.thread_name_prefix.as_str(), "started",
            workers = worker_count, starvation_threshold = shared.config.starvation_threshold);

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
            fault_rx,
        })
    }

    /// Queues `task` under `priority`, unless the pool is draining.
    pub fn submit<T: Task>(&self, task: T, priority: Priority) -> Admission {
        self.admit(Box::new(task), priority)
    }

    /// Queues an already-boxed task.
    ///
    /// Fails with [`PoolError::MissingTask`] for `None`; nothing is queued
    /// and no worker is woken.
    pub fn submit_boxed(&self, task: Option<BoxedTask>, priority: Priority) -> Result<Admission, PoolError> {
        let task = task.ok_or(PoolError::MissingTask)?;
        Ok(self.admit(task, priority))
    }

    fn admit(&self, task: BoxedTask, priority: Priority) -> Admission {
        if !self.shared.is_accepting() {
            debug!(priority = %priority, "submission rejected, pool is draining");
            return Admission::Rejected;
        }
        let id = TaskId::new();
        log_scheduler!("tier_queue", "task_admitted", task_id = %id, priority = %priority);
        self.shared.queue.enqueue(QueuedTask::new(id, priority, task));
        Admission::Accepted(id)
    }

    /// Stops admission and blocks until every queued task has run.
    ///
    /// Tasks already executing are waited for as well. Concurrent callers all
    /// return once the same drain completes. Must not be called from inside a
    /// task running on this pool.
    pub fn stop(&self) {
        self.shared.stop(None);
    }

    /// Like [`stop`](Self::stop) but gives up after `timeout`.
    ///
    /// Admission stays closed on timeout; call `stop` again to keep waiting.
    pub fn stop_timeout(&self, timeout: Duration) -> Result<(), PoolError> {
        if self.shared.stop(Some(Instant::now() + timeout)) {
            Ok(())
        } else {
            Err(PoolError::DrainTimeout(timeout))
        }
    }

    /// Async form of [`stop`](Self::stop); the wait runs on tokio's blocking
    /// thread pool so the calling task's executor thread is not held.
    pub async fn stop_async(&self) -> Result<(), PoolError> {
        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || shared.stop(None))
            .await
            .map_err(|e| PoolError::Other(anyhow!("drain wait failed: {e}")))?;
        Ok(())
    }

    /// Re-opens admission. Has no effect after `shutdown`.
    pub fn resume(&self) {
        if self.shared.queue.is_shut_down() {
            warn!("resume ignored, pool has been shut down");
            return;
        }
        self.shared.accepting.store(true, Ordering::SeqCst);
        log_lifecycle!("pool", self.shared.config.thread_name_prefix.as_str(), "resumed");
    }

    /// Drains the queue, then stops and joins every worker thread.
    ///
    /// Returns [`PoolError::WorkerPanicked`] if any worker had already died
    /// from a propagated task panic.
    pub fn shutdown(&self) -> Result<(), PoolError> {
        self.stop();
        self.shared.queue.request_shutdown();

        let handles = std::mem::take(&mut *self.workers.lock());
        let panicked = handles
            .into_iter()
            .map(JoinHandle::join)
            .filter(Result::is_err)
            .count();

        log_lifecycle!("pool", self.shared.config.thread_name_prefix.as_str(), "shut down",
            panicked_workers = panicked);
        if panicked > 0 {
            return Err(PoolError::WorkerPanicked(panicked));
        }
        Ok(())
    }

    pub fn state(&self) -> PoolState {
        if self.shared.is_accepting() {
            PoolState::Accepting
        } else {
            PoolState::Draining
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.shared.is_accepting()
    }

    pub fn worker_count(&self) -> usize {
        self.shared.config.worker_count
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Receiver for fault reports. Every clone competes for the same reports.
    pub fn faults(&self) -> flume::Receiver<TaskFault> {
        self.fault_rx.clone()
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            worker_count: self.worker_count(),
            live_workers: self.shared.live_workers.load(Ordering::SeqCst),
            state: self.state(),
            queue: self.shared.queue.snapshot(),
            completed: self.shared.completed.load(Ordering::Relaxed),
            faulted: self.shared.faulted.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.queue.request_shutdown();
    }
}

impl TaskScheduler for ThreadPool {
    fn schedule(&self, task: BoxedTask, priority: Priority) -> Admission {
        self.admit(task, priority)
    }

    fn stop(&self) {
        ThreadPool::stop(self)
    }

    fn resume(&self) {
        ThreadPool::resume(self)
    }

    fn shutdown(&self) -> Result<(), PoolError> {
        ThreadPool::shutdown(self)
    }

    fn metrics(&self) -> PoolMetrics {
        ThreadPool::metrics(self)
    }
}
