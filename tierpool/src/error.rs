use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the pool's public operations.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Worker count must be positive, got {0}")]
    InvalidWorkerCount(i64),
    #[error("Starvation threshold must be at least 1")]
    InvalidStarvationThreshold,
    #[error("No task supplied for submission")]
    MissingTask,
    #[error("Thread setup error: {0}")]
    ThreadSpawn(String),
    #[error("Drain did not complete within {0:?}")]
    DrainTimeout(Duration),
    #[error("{0} worker thread(s) terminated by a task panic")]
    WorkerPanicked(usize),
    #[error("Internal pool error: {0}")]
    Other(#[from] anyhow::Error),
}
