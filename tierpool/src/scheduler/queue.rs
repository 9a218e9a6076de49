use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::trace;

use tierpool_api::{BoxedTask, Priority, TaskId};

/// A task admitted into the pool, tagged with the id and tier it was
/// submitted under.
pub struct QueuedTask {
    /// Id handed back to the submitter
    pub id: TaskId,

    /// Tier the task was queued in
    pub priority: Priority,

    /// The work itself
    pub task: BoxedTask,
}

impl QueuedTask {
    pub fn new(id: TaskId, priority: Priority, task: BoxedTask) -> Self {
        Self { id, priority, task }
    }
}

impl fmt::Debug for QueuedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedTask")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Three FIFO tiers plus the anti-starvation run counter.
///
/// `TierQueues` is the pure scheduling policy: it does no locking and knows
/// nothing about workers or draining. [`SchedulingQueue`] wraps it in the
/// pool's single lock.
///
/// # Dequeue rule
/// 1. All tiers empty: reset the run counter, return `None`.
/// 2. Only `Low` has items: reset the counter, pop `Low`.
/// 3. `Normal` non-empty and the counter has reached the threshold: reset
///    the counter, pop `Normal`.
/// 4. `High` empty: reset the counter, pop `Normal`.
/// 5. Otherwise: increment the counter, pop `High`.
#[derive(Debug)]
pub struct TierQueues<T> {
    high: VecDeque<T>,
    normal: VecDeque<T>,
    low: VecDeque<T>,

    /// Consecutive `High` dequeues since the last `Normal`/`Low` one
    high_run: usize,

    /// Run length after which a waiting `Normal` item is forced through
    starvation_threshold: usize,
}

impl<T> TierQueues<T> {
    pub fn new(starvation_threshold: usize) -> Self {
        Self {
            high: VecDeque::new(),
            normal: VecDeque::new(),
            low: VecDeque::new(),
            high_run: 0,
            starvation_threshold,
        }
    }

    /// Appends `item` to the tail of its tier.
    pub fn push(&mut self, priority: Priority, item: T) {
        self.tier_mut(priority).push_back(item);
    }

    /// Removes the next item according to the dequeue rule.
    pub fn pop_next(&mut self) -> Option<T> {
        if self.is_empty() {
            self.high_run = 0;
            return None;
        }

        if self.high.is_empty() && self.normal.is_empty() {
            self.high_run = 0;
            return self.low.pop_front();
        }

        if !self.normal.is_empty() && self.high_run >= self.starvation_threshold {
            self.high_run = 0;
            return self.normal.pop_front();
        }

        if self.high.is_empty() {
            self.high_run = 0;
            return self.normal.pop_front();
        }

        self.high_run += 1;
        self.high.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.normal.is_empty() && self.low.is_empty()
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.normal.len() + self.low.len()
    }

    /// Number of items pending in one tier.
    pub fn len_of(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high.len(),
            Priority::Normal => self.normal.len(),
            Priority::Low => self.low.len(),
        }
    }

    /// Current value of the high-priority run counter.
    pub fn high_run(&self) -> usize {
        self.high_run
    }

    pub fn starvation_threshold(&self) -> usize {
        self.starvation_threshold
    }

    fn tier_mut(&mut self, priority: Priority) -> &mut VecDeque<T> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Normal => &mut self.normal,
            Priority::Low => &mut self.low,
        }
    }
}

/// Everything guarded by the scheduling lock.
#[derive(Debug)]
pub struct QueueState {
    pub(crate) tiers: TierQueues<QueuedTask>,

    /// Tasks dequeued and currently executing
    pub(crate) in_flight: usize,

    /// Drain-complete gate; lowered when a stop begins, raised once the
    /// tiers are empty and nothing is in flight
    pub(crate) drained: bool,

    /// Workers exit instead of parking once this is set
    pub(crate) shutdown: bool,
}

impl QueueState {
    /// Tiers empty and no task executing.
    pub fn is_idle(&self) -> bool {
        self.tiers.is_empty() && self.in_flight == 0
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            high: self.tiers.len_of(Priority::High),
            normal: self.tiers.len_of(Priority::Normal),
            low: self.tiers.len_of(Priority::Low),
            in_flight: self.in_flight,
            high_run: self.tiers.high_run(),
        }
    }
}

/// Point-in-time view of the queue, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueSnapshot {
    pub high: usize,
    pub normal: usize,
    pub low: usize,
    pub in_flight: usize,
    pub high_run: usize,
}

impl QueueSnapshot {
    /// Total pending tasks across all tiers.
    pub fn queued(&self) -> usize {
        self.high + self.normal + self.low
    }
}

/// The pool's priority queue.
///
/// The tiers, the run counter, the in-flight count and the drain gate form a
/// single consistency unit behind one mutex: every enqueue and every full
/// application of the dequeue rule happens atomically under it.
///
/// # Thread Safety
/// - `not_empty` wakes parked workers; its predicate is "some tier has work"
/// - `drain_gate` wakes callers blocked in a stop once the gate is raised
/// - Condition waits always re-check state after waking, so spurious and
///   stale wakeups only cost a redundant dequeue attempt
pub struct SchedulingQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    drain_gate: Condvar,
}

impl fmt::Debug for SchedulingQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulingQueue")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl SchedulingQueue {
    pub fn new(starvation_threshold: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                tiers: TierQueues::new(starvation_threshold),
                in_flight: 0,
                drained: false,
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            drain_gate: Condvar::new(),
        }
    }

    /// Acquires the scheduling lock.
    pub fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock()
    }

    /// Appends a task to its tier and wakes one parked worker.
    pub fn enqueue(&self, task: QueuedTask) {
        let mut state = self.state.lock();
        trace!(task_id = %task.id, priority = %task.priority, "enqueue");
        state.tiers.push(task.priority, task);
        self.not_empty.notify_one();
    }

    /// Applies the dequeue rule under an already-held lock.
    ///
    /// When nothing is left and a stop has been requested, the last worker to
    /// go idle raises the drain gate.
    pub fn dequeue(&self, state: &mut QueueState, stop_requested: bool) -> Option<QueuedTask> {
        let next = state.tiers.pop_next();
        if next.is_none() && stop_requested {
            self.raise_gate_if_idle(state);
        }
        next
    }

    /// Raises the drain gate if the queue is empty and no task is running.
    ///
    /// Returns whether the gate is raised afterwards.
    pub fn raise_gate_if_idle(&self, state: &mut QueueState) -> bool {
        if !state.drained && state.is_idle() {
            state.drained = true;
            self.drain_gate.notify_all();
        }
        state.drained
    }

    /// Lowers the drain gate so the next wait observes a fresh drain.
    pub fn rearm_gate(&self, state: &mut QueueState) {
        state.drained = false;
    }

    /// Blocks a worker until `not_empty` is signalled.
    pub fn wait_for_work(&self, state: &mut MutexGuard<'_, QueueState>) {
        self.not_empty.wait(state);
    }

    /// Wakes every parked worker.
    pub fn wake_all(&self) {
        self.not_empty.notify_all();
    }

    /// Blocks until the drain gate is raised.
    pub fn wait_drained(&self, state: &mut MutexGuard<'_, QueueState>) {
        while !state.drained {
            self.drain_gate.wait(state);
        }
    }

    /// Blocks until the drain gate is raised or `deadline` passes.
    ///
    /// Returns `true` if the gate was raised.
    pub fn wait_drained_until(&self, state: &mut MutexGuard<'_, QueueState>, deadline: Instant) -> bool {
        while !state.drained {
            if self.drain_gate.wait_until(state, deadline).timed_out() {
                return state.drained;
            }
        }
        true
    }

    /// Tells workers to exit once the tiers are empty.
    pub fn request_shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        self.not_empty.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shutdown
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.state.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.state.lock().tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tiers.is_empty()
    }
}
