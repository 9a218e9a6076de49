use crate::error::PoolError;

/// Consecutive `High` dequeues after which a waiting `Normal` task is forced.
pub const DEFAULT_STARVATION_THRESHOLD: usize = 3;

pub const DEFAULT_THREAD_NAME_PREFIX: &str = "tierpool-worker";

/// Fault reports buffered before new ones are dropped.
pub const DEFAULT_FAULT_REPORT_CAPACITY: usize = 1024;

/// What a worker does when a task panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Catch the panic, log and report it, and keep the worker running.
    #[default]
    Isolate,
    /// Let the panic unwind out of the worker thread. The worker dies and
    /// the pool permanently loses one thread.
    Propagate,
}

/// Configuration for a [`ThreadPool`](crate::scheduler::ThreadPool).
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads, fixed for the life of the pool.
    pub worker_count: usize,

    /// See [`DEFAULT_STARVATION_THRESHOLD`].
    pub starvation_threshold: usize,

    /// Worker threads are named `<prefix>-<index>`.
    pub thread_name_prefix: String,

    pub fault_policy: FaultPolicy,

    /// Capacity of the fault report channel.
    pub fault_report_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            starvation_threshold: DEFAULT_STARVATION_THRESHOLD,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            fault_policy: FaultPolicy::Isolate,
            fault_report_capacity: DEFAULT_FAULT_REPORT_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Default configuration with an explicit worker count.
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    /// Sets the worker count from a signed source such as a CLI flag,
    /// rejecting anything that is not positive.
    pub fn with_signed_worker_count(mut self, worker_count: i64) -> Result<Self, PoolError> {
        if worker_count <= 0 {
            return Err(PoolError::InvalidWorkerCount(worker_count));
        }
        self.worker_count = usize::try_from(worker_count)
            .map_err(|_| PoolError::InvalidWorkerCount(worker_count))?;
        Ok(self)
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_starvation_threshold(mut self, threshold: usize) -> Self {
        self.starvation_threshold = threshold;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    pub fn with_fault_report_capacity(mut self, capacity: usize) -> Self {
        self.fault_report_capacity = capacity;
        self
    }

    /// Checks the configuration before any thread is started.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.worker_count == 0 {
            return Err(PoolError::InvalidWorkerCount(0));
        }
        if self.starvation_threshold == 0 {
            return Err(PoolError::InvalidStarvationThreshold);
        }
        Ok(())
    }
}
