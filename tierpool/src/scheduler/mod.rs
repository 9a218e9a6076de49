//! # Scheduler Module
//!
//! The fixed-size priority pool and its parts.
//!
//! ## Key Concepts
//! - Tiers: `High`, `Normal` and `Low` FIFO sequences behind one lock
//! - Starvation bound: after a run of `High` dequeues a waiting `Normal`
//!   task is forced through
//! - Drain: `stop` closes admission and waits until nothing is queued or
//!   running
//!
//! ## Layout
//! - [`queue`]: the tiers, the dequeue rule and the drain gate
//! - `worker`: the consume-and-execute loop
//! - `pool`: the controller that owns both

pub mod fault;
pub mod queue;
mod pool;
mod worker;

use std::fmt;

use tierpool_api::{BoxedTask, Priority};

use crate::error::PoolError;

pub use fault::TaskFault;
pub use pool::{Admission, PoolMetrics, PoolState, ThreadPool};
pub use queue::{QueueSnapshot, SchedulingQueue, TierQueues};

/// Common interface for code that hands work to a pool without knowing
/// its concrete type.
pub trait TaskScheduler: fmt::Debug + Send + Sync {
    /// Queue a task under the given priority
    fn schedule(&self, task: BoxedTask, priority: Priority) -> Admission;

    /// Close admission and block until the backlog has drained
    fn stop(&self);

    /// Re-open admission
    fn resume(&self);

    /// Drain, then stop and join the worker threads
    fn shutdown(&self) -> Result<(), PoolError>;

    /// Snapshot of pool counters
    fn metrics(&self) -> PoolMetrics;
}
