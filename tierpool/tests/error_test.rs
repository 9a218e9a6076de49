// Integration tests for error types in tierpool::error

use std::time::Duration;

use anyhow::anyhow;
use tierpool::PoolError;

#[test]
fn test_pool_error_display() {
    assert_eq!(PoolError::InvalidWorkerCount(-1).to_string(), "Worker count must be positive, got -1");
    assert_eq!(PoolError::InvalidStarvationThreshold.to_string(), "Starvation threshold must be at least 1");
    assert_eq!(PoolError::MissingTask.to_string(), "No task supplied for submission");
    assert_eq!(PoolError::ThreadSpawn("no memory".to_string()).to_string(), "Thread setup error: no memory");
    assert_eq!(PoolError::DrainTimeout(Duration::from_millis(250)).to_string(), "Drain did not complete within 250ms");
    assert_eq!(PoolError::WorkerPanicked(2).to_string(), "2 worker thread(s) terminated by a task panic");
}

#[test]
fn test_pool_error_from_anyhow() {
    let err: PoolError = anyhow!("join failed").into();
    assert!(matches!(err, PoolError::Other(_)));
    assert!(err.to_string().contains("join failed"));
}
