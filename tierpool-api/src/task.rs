//! # Units of Work
//!
//! A [`Task`] is opaque to the scheduler. The pool never inspects or clones
//! it; each submission goes to exactly one worker, which consumes it by
//! calling [`Task::execute`].

use std::fmt;

use uuid::Uuid;

/// A zero-argument unit of work with no return value.
///
/// `execute` consumes the task, so the type system guarantees each
/// submission runs at most once. A panic escaping `execute` is an execution
/// fault; what the pool does with it is decided by the pool's fault policy.
pub trait Task: Send + 'static {
    /// Runs the task to completion on the calling thread.
    fn execute(self: Box<Self>);
}

impl<F> Task for F
where
    F: FnOnce() + Send + 'static,
{
    fn execute(self: Box<Self>) {
        (*self)()
    }
}

/// Owned, type-erased task as stored in a queue tier.
pub type BoxedTask = Box<dyn Task>;

/// Identifier handed out when a task is admitted.
///
/// Ids carry no ordering or scheduling meaning; they exist so a submitter
/// can correlate its submission with worker logs and fault reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_executes_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let task: BoxedTask = Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        task.execute();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }
}
