// tierpool
//
// A fixed-size worker pool that runs submitted tasks under a three-tier
// priority policy with a starvation bound, and supports a stop / drain /
// resume lifecycle.
//
// ```rust
// use tierpool::{Priority, ThreadPool};
//
// let pool = ThreadPool::new(4)?;
// let admission = pool.submit(|| println!("hello from a worker"), Priority::High);
// assert!(admission.is_accepted());
// pool.stop();   // blocks until the backlog has run
// pool.resume(); // admission re-opened
// # Ok::<(), tierpool::PoolError>(())
// ```

pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;

// Re-export commonly used types
pub use config::{FaultPolicy, PoolConfig, DEFAULT_STARVATION_THRESHOLD};
pub use error::PoolError;
pub use scheduler::{Admission, PoolMetrics, PoolState, TaskFault, TaskScheduler, ThreadPool};
pub use tierpool_api::{BoxedTask, Priority, Task, TaskId};
