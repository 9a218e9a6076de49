// Drives a three-worker pool through a full stop / resume cycle.
//
// Run with: RUST_LOG=tierpool=debug cargo run --example tranquility

use std::thread;
use std::time::Duration;

use anyhow::Result;
use tierpool::logging::{self, info};
use tierpool::{Priority, ThreadPool};

fn tranquility(priority: Priority, millis: u64) -> impl FnOnce() + Send + 'static {
    move || {
        let name = thread::current().name().unwrap_or("worker").to_string();
        info!("{name} is now working on {priority} priority task");
        thread::sleep(Duration::from_millis(millis));
        info!("{name} {priority} priority task is done");
    }
}

fn submit_round(pool: &ThreadPool, rounds: usize) -> usize {
    let mut accepted = 0;
    for _ in 0..rounds {
        for (priority, millis) in [(Priority::High, 500), (Priority::Normal, 300), (Priority::Low, 100)] {
            if pool.submit(tranquility(priority, millis), priority).is_accepted() {
                accepted += 1;
            }
        }
    }
    accepted
}

fn main() -> Result<()> {
    logging::init_development();

    let pool = ThreadPool::new(3)?;

    info!("first tasks");
    let accepted = submit_round(&pool, 4);
    info!(accepted, "queued first batch");
    thread::sleep(Duration::from_secs(2));

    info!("second tasks");
    submit_round(&pool, 2);

    info!("signal stop");
    pool.stop();
    info!("after signal stop");

    for _ in 0..4 {
        let admission = pool.submit(tranquility(Priority::High, 500), Priority::High);
        info!(accepted = admission.is_accepted(), "submit while draining");
    }

    pool.resume();
    info!("after resume");
    for _ in 0..4 {
        let admission = pool.submit(tranquility(Priority::Low, 100), Priority::Low);
        info!(accepted = admission.is_accepted(), "submit after resume");
    }

    pool.shutdown()?;
    let metrics = pool.metrics();
    info!(completed = metrics.completed, faulted = metrics.faulted, "end");
    Ok(())
}
