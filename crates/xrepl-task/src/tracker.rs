//! Task tracker — per-task polling state machine.
//!
//! Folds status query results into `RUNNING → SUCCEEDED | FAILED`, keeps
//! the backoff schedule for transient query errors, and enforces the
//! attempt cap. Once an outcome
//! has been produced the tracker is finished and ignores further input.

use std::time::Duration;

use tracing::{debug, info, warn};

use xrepl_core::{ApiError, PollConfig, TaskId, TaskStatus};

/// How watching a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded,
    Failed,
    /// The attempt cap was hit while the task was still running.
    StoppedWatching,
    /// The status endpoint answered with a permanent error; the task's
    /// fate cannot be learned by asking again.
    StatusUnknown,
}

/// Delivered once per task when watching ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub result: TaskResult,
    /// Status queries issued, including failed ones.
    pub attempts: u32,
}

impl TaskOutcome {
    /// The task itself reported failure.
    pub fn failed(&self) -> bool {
        self.result == TaskResult::Failed
    }
}

/// Tracks status queries for a single task.
#[derive(Debug)]
pub struct TaskTracker {
    task_id: TaskId,
    /// Last status actually observed.
    status: TaskStatus,
    attempts: u32,
    consecutive_errors: u32,
    max_attempts: u32,
    current_backoff: Duration,
    base_interval: Duration,
    max_backoff: Duration,
    finished: bool,
}

impl TaskTracker {
    /// Create a tracker for `task_id` paced by `config`.
    pub fn new(task_id: &str, config: &PollConfig) -> Self {
        Self::with_limits(
            task_id,
            config.interval(),
            config.max_backoff(),
            config.max_attempts,
        )
    }

    /// Create a tracker with explicit limits (for testing).
    pub fn with_limits(
        task_id: &str,
        interval: Duration,
        max_backoff: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: TaskStatus::Running,
            attempts: 0,
            consecutive_errors: 0,
            max_attempts,
            current_backoff: interval,
            base_interval: interval,
            max_backoff,
            finished: false,
        }
    }

    /// Record one status query result.
    ///
    /// Returns the outcome exactly once: on the first terminal status, or
    /// when the attempt cap is reached. Every later call returns `None`.
    pub fn record(&mut self, result: Result<TaskStatus, ApiError>) -> Option<TaskOutcome> {
        if self.finished {
            return None;
        }
        self.attempts += 1;

        match result {
            Ok(status) => {
                self.consecutive_errors = 0;
                self.current_backoff = self.base_interval;
                self.status = status;
                debug!(task = %self.task_id, ?status, attempt = self.attempts, "task status");

                match status {
                    TaskStatus::Succeeded => return Some(self.finish(TaskResult::Succeeded)),
                    TaskStatus::Failed => return Some(self.finish(TaskResult::Failed)),
                    TaskStatus::Running => {}
                }
            }
            Err(e) if !e.is_transient() => {
                warn!(task = %self.task_id, error = %e, "task status unreadable, giving up");
                return Some(self.finish(TaskResult::StatusUnknown));
            }
            Err(e) => {
                self.consecutive_errors += 1;
                // Exponential backoff: double the interval up to max.
                self.current_backoff = (self.current_backoff * 2).min(self.max_backoff);
                warn!(
                    task = %self.task_id,
                    error = %e,
                    errors = self.consecutive_errors,
                    "task status unknown, retrying"
                );
            }
        }

        if self.attempts >= self.max_attempts {
            warn!(
                task = %self.task_id,
                attempts = self.attempts,
                "attempt cap reached, task still running"
            );
            return Some(self.finish(TaskResult::StoppedWatching));
        }
        None
    }

    fn finish(&mut self, result: TaskResult) -> TaskOutcome {
        self.finished = true;
        info!(task = %self.task_id, ?result, attempts = self.attempts, "stopped watching task");
        TaskOutcome {
            task_id: self.task_id.clone(),
            result,
            attempts: self.attempts,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Last observed status (starts as `Running`).
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Delay before the next query. The first query is immediate.
    pub fn next_interval(&self) -> Duration {
        if self.attempts == 0 {
            Duration::ZERO
        } else {
            self.current_backoff
        }
    }
}
