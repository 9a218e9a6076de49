mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use common::{occupy_worker, wait_until};
use tierpool::{Admission, PoolConfig, PoolError, PoolState, Priority, TaskScheduler, ThreadPool};

#[test]
fn test_construct_rejects_zero_workers() {
    let err = ThreadPool::new(0).unwrap_err();
    assert!(matches!(err, PoolError::InvalidWorkerCount(0)));
}

#[test]
fn test_construct_rejects_negative_workers() {
    let err = PoolConfig::default().with_signed_worker_count(-1).unwrap_err();
    assert!(matches!(err, PoolError::InvalidWorkerCount(-1)));
}

#[test]
fn test_construct_starts_exactly_three_workers() {
    let pool = ThreadPool::new(3).unwrap();
    assert_eq!(pool.worker_count(), 3);
    assert_eq!(pool.metrics().live_workers, 3);

    // All three must be running at once for the barrier to open.
    let barrier = Arc::new(Barrier::new(4));
    let names = Arc::new(Mutex::new(HashSet::new()));
    for _ in 0..3 {
        let barrier = barrier.clone();
        let names = names.clone();
        let _ = pool.submit(
            move || {
                let name = std::thread::current().name().unwrap_or_default().to_string();
                names.lock().unwrap().insert(name);
                barrier.wait();
            },
            Priority::Normal,
        );
    }
    barrier.wait();
    pool.stop();

    let names = names.lock().unwrap();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| n.starts_with("tierpool-worker-")));
    pool.shutdown().unwrap();
}

#[test]
fn test_stop_waits_for_every_queued_task() {
    let pool = ThreadPool::new(3).unwrap();
    let done = Arc::new(AtomicUsize::new(0));
    for i in 0..30 {
        let done = done.clone();
        let priority = [Priority::Low, Priority::Normal, Priority::High][i % 3];
        let admission = pool.submit(
            move || {
                std::thread::sleep(Duration::from_millis(2));
                done.fetch_add(1, Ordering::SeqCst);
            },
            priority,
        );
        assert!(admission.is_accepted());
    }

    pool.stop();
    assert_eq!(done.load(Ordering::SeqCst), 30);

    let metrics = pool.metrics();
    assert_eq!(metrics.state, PoolState::Draining);
    assert_eq!(metrics.completed, 30);
    assert_eq!(metrics.queue.queued(), 0);
    assert_eq!(metrics.queue.in_flight, 0);
    pool.shutdown().unwrap();
}

#[test]
fn test_submit_after_stop_is_rejected_and_never_runs() {
    let pool = ThreadPool::new(2).unwrap();
    pool.stop();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let admission = pool.submit(move || flag.store(true, Ordering::SeqCst), Priority::High);
    assert_eq!(admission, Admission::Rejected);
    assert!(!pool.is_accepting());

    std::thread::sleep(Duration::from_millis(50));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(pool.metrics().queue.queued(), 0);
    pool.shutdown().unwrap();
}

#[test]
fn test_resume_reopens_admission_and_second_stop_waits_again() {
    let pool = ThreadPool::new(2).unwrap();
    pool.stop();
    pool.resume();
    assert_eq!(pool.state(), PoolState::Accepting);

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let admission = pool.submit(
        move || {
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        },
        Priority::Low,
    );
    assert!(admission.is_accepted());
    assert!(admission.task_id().is_some());

    // The gate raised by the first stop must not satisfy this one.
    pool.stop();
    assert!(ran.load(Ordering::SeqCst));
    pool.shutdown().unwrap();
}

#[test]
fn test_overlapping_stops_both_return() {
    let pool = ThreadPool::new(1).unwrap();
    let release = occupy_worker(&pool);
    let done = Arc::new(AtomicUsize::new(0));
    let counter = done.clone();
    let _ = pool.submit(move || { counter.fetch_add(1, Ordering::SeqCst); }, Priority::High);

    std::thread::scope(|scope| {
        let first = scope.spawn(|| pool.stop());
        let second = scope.spawn(|| pool.stop());
        std::thread::sleep(Duration::from_millis(30));
        assert!(!first.is_finished());
        assert!(!second.is_finished());
        release.send(()).unwrap();
        first.join().unwrap();
        second.join().unwrap();
    });

    assert_eq!(done.load(Ordering::SeqCst), 1);
    pool.shutdown().unwrap();
}

#[test]
fn test_stop_timeout_gives_up_on_long_task() {
    let pool = ThreadPool::new(1).unwrap();
    let release = occupy_worker(&pool);

    let err = pool.stop_timeout(Duration::from_millis(50)).unwrap_err();
    assert!(matches!(err, PoolError::DrainTimeout(d) if d == Duration::from_millis(50)));
    assert_eq!(pool.state(), PoolState::Draining);
    assert_eq!(pool.submit(|| {}, Priority::High), Admission::Rejected);

    release.send(()).unwrap();
    pool.stop_timeout(Duration::from_secs(5)).unwrap();
    pool.shutdown().unwrap();
}

#[test]
fn test_shutdown_joins_workers_and_blocks_resume() {
    let pool = ThreadPool::new(2).unwrap();
    let done = Arc::new(AtomicUsize::new(0));
    for _ in 0..10 {
        let done = done.clone();
        let _ = pool.submit(move || { done.fetch_add(1, Ordering::SeqCst); }, Priority::Normal);
    }

    pool.shutdown().unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 10);
    assert_eq!(pool.metrics().live_workers, 0);

    pool.resume();
    assert_eq!(pool.state(), PoolState::Draining);
    assert_eq!(pool.submit(|| {}, Priority::Normal), Admission::Rejected);
}

#[test]
fn test_drop_lets_queued_work_finish() {
    let pool = ThreadPool::new(1).unwrap();
    let release = occupy_worker(&pool);
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let _ = pool.submit(move || flag.store(true, Ordering::SeqCst), Priority::Low);

    drop(pool);
    release.send(()).unwrap();
    assert!(wait_until(|| ran.load(Ordering::SeqCst)));
}

#[test]
fn test_pool_behind_scheduler_trait() {
    let scheduler: Arc<dyn TaskScheduler> = Arc::new(ThreadPool::new(2).unwrap());
    let done = Arc::new(AtomicUsize::new(0));
    let counter = done.clone();

    let admission = scheduler.schedule(
        Box::new(move || { counter.fetch_add(1, Ordering::SeqCst); }),
        Priority::High,
    );
    assert!(admission.is_accepted());

    scheduler.stop();
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.metrics().completed, 1);
    scheduler.resume();
    scheduler.shutdown().unwrap();
}

#[test]
fn test_custom_thread_name_prefix() {
    let config = PoolConfig::new(1).with_thread_name_prefix("ingest");
    let pool = ThreadPool::with_config(config).unwrap();
    let name = Arc::new(Mutex::new(String::new()));
    let slot = name.clone();
    let _ = pool.submit(
        move || *slot.lock().unwrap() = std::thread::current().name().unwrap_or_default().to_string(),
        Priority::Normal,
    );
    pool.stop();
    assert_eq!(*name.lock().unwrap(), "ingest-0");
    pool.shutdown().unwrap();
}
