//! # tierpool API
//!
//! The contract between code that submits work and the pool that runs it.
//! A unit of work is a [`Task`]: it takes no arguments and returns nothing.
//! Each submission is executed at most once. Work is routed into one of
//! three tiers by its [`Priority`].
//!
//! ## Usage Example
//!
//! ```rust
//! use tierpool_api::{BoxedTask, Priority, Task};
//!
//! struct Flush;
//!
//! impl Task for Flush {
//!     fn execute(self: Box<Self>) {
//!         // write buffered records somewhere
//!     }
//! }
//!
//! let job: BoxedTask = Box::new(Flush);
//! let closure: BoxedTask = Box::new(|| println!("closures are tasks too"));
//! assert!(Priority::High > Priority::Normal);
//! # let _ = (job, closure);
//! ```
//!
//! ## Module Organization
//!
//! - [`task`]: the `Task` trait and task identifiers
//! - [`priority`]: the three scheduling tiers

pub mod priority;
pub mod task;

pub use priority::{ParsePriorityError, Priority};
pub use task::{BoxedTask, Task, TaskId};
