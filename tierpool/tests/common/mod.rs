#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tierpool::{Priority, ThreadPool};

/// Default wait for conditions that depend on worker progress
pub const WAIT: Duration = Duration::from_secs(5);

/// Shared log of task labels in the order they started executing.
#[derive(Clone, Default)]
pub struct ExecutionLog(Arc<Mutex<Vec<&'static str>>>);

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: &'static str) {
        self.0.lock().unwrap().push(label);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    /// Submits a task that records `label` when it runs.
    pub fn submit(&self, pool: &ThreadPool, label: &'static str, priority: Priority) {
        let log = self.clone();
        let admission = pool.submit(move || log.record(label), priority);
        assert!(admission.is_accepted(), "{label} should be admitted");
    }
}

/// Holds one worker busy until the returned sender is dropped or used.
///
/// Returns only after the blocking task has been picked up, so everything
/// submitted afterwards is queued behind it.
pub fn occupy_worker(pool: &ThreadPool) -> flume::Sender<()> {
    let (started_tx, started_rx) = flume::bounded(1);
    let (release_tx, release_rx) = flume::bounded::<()>(1);
    let admission = pool.submit(
        move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
        },
        Priority::Normal,
    );
    assert!(admission.is_accepted());
    started_rx
        .recv_timeout(WAIT)
        .expect("blocking task should start");
    release_tx
}

/// Polls `condition` until it holds or `WAIT` elapses.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
