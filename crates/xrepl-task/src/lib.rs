//! xrepl-task — watching long-running server tasks to completion.
//!
//! A membership update is accepted by the server long before it takes
//! effect. The server hands back a task id; this crate polls that task
//! until it reaches a terminal state and delivers the outcome exactly once.
//!
//! # Architecture
//!
//! ```text
//! TaskPoller::spawn(task_id, callback)
//!   └── background task
//!       ├── TaskTracker (attempt cap, backoff after query errors)
//!       ├── StatusSource::task_status() → TaskStatus | ApiError
//!       └── on terminal: callback(outcome), then oneshot → PendingTask::wait()
//! ```
//!
//! Query errors mean "status unknown", never "task failed": they are
//! retried with exponential backoff. Dropping or abandoning the returned
//! [`PendingTask`] stops the watcher; the server task keeps running.

pub mod poller;
pub mod tracker;

pub use poller::{
    CompletionCallback, CompletionFuture, PendingTask, StatusFuture, StatusSource, TaskPoller,
};
pub use tracker::{TaskOutcome, TaskResult, TaskTracker};
