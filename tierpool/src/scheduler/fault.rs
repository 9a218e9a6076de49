use std::any::Any;
use std::fmt;

use tierpool_api::{Priority, TaskId};

/// Report published when a task panics on a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFault {
    /// Id the task was admitted under
    pub task_id: TaskId,

    /// Tier it ran from
    pub priority: Priority,

    /// Name of the worker thread that ran it
    pub worker: String,

    /// Panic payload rendered as text
    pub message: String,
}

impl fmt::Display for TaskFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} ({}) panicked on {}: {}",
            self.task_id, self.priority, self.worker, self.message
        )
    }
}

/// Renders a panic payload the way the standard panic hook does.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
