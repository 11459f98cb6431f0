//! Operator notifications for failures.
//!
//! Reporters never fail and never block: [`TracingReporter`] logs,
//! [`ChannelReporter`] pushes onto an unbounded channel drained by the
//! operator surface.

use tokio::sync::mpsc;
use tracing::{error, warn};

use xrepl_core::{ApiConfig, SubmissionError, TaskId};

/// Surfaces failures to the operator.
pub trait ErrorReporter: Send + Sync {
    /// The membership update request was not accepted.
    fn report_submission_failure(&self, err: &SubmissionError);

    /// The task was accepted but ended in failure.
    fn report_task_failure(&self, task_id: &TaskId);

    /// Polling gave up while the task was still running.
    fn report_still_running(&self, task_id: &TaskId);

    /// The task status could not be read at all.
    fn report_status_unknown(&self, task_id: &TaskId);
}

/// A failure notification, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SubmissionFailed { message: String },
    TaskFailed { task_id: TaskId, details_url: String },
    StillRunning { task_id: TaskId, details_url: String },
    StatusUnknown { task_id: TaskId, details_url: String },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::SubmissionFailed { message } => f.write_str(message),
            Notification::TaskFailed { details_url, .. } => {
                write!(f, "Unable to add table. View details: {details_url}")
            }
            Notification::StillRunning { details_url, .. } => {
                write!(f, "Task is still running, stopped watching. View details: {details_url}")
            }
            Notification::StatusUnknown { details_url, .. } => {
                write!(f, "Unable to read task status. View details: {details_url}")
            }
        }
    }
}

/// Logs failures through `tracing`.
pub struct TracingReporter {
    api: ApiConfig,
}

impl TracingReporter {
    pub fn new(api: ApiConfig) -> Self {
        Self { api }
    }
}

impl ErrorReporter for TracingReporter {
    fn report_submission_failure(&self, err: &SubmissionError) {
        error!(error = %err.operator_message(), "unable to submit membership update");
    }

    fn report_task_failure(&self, task_id: &TaskId) {
        error!(task = %task_id, details = %self.api.task_link(task_id), "unable to add table");
    }

    fn report_still_running(&self, task_id: &TaskId) {
        warn!(task = %task_id, details = %self.api.task_link(task_id), "task still running, stopped watching");
    }

    fn report_status_unknown(&self, task_id: &TaskId) {
        warn!(task = %task_id, details = %self.api.task_link(task_id), "task status unreadable");
    }
}

/// Queues failures as [`Notification`]s.
pub struct ChannelReporter {
    api: ApiConfig,
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelReporter {
    /// Create a reporter and the receiver the operator surface drains.
    pub fn new(api: ApiConfig) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { api, tx }, rx)
    }

    fn push(&self, notification: Notification) {
        // A closed receiver means nobody is listening any more.
        if self.tx.send(notification).is_err() {
            warn!("notification dropped, receiver closed");
        }
    }
}

impl ErrorReporter for ChannelReporter {
    fn report_submission_failure(&self, err: &SubmissionError) {
        self.push(Notification::SubmissionFailed {
            message: err.operator_message(),
        });
    }

    fn report_task_failure(&self, task_id: &TaskId) {
        self.push(Notification::TaskFailed {
            task_id: task_id.clone(),
            details_url: self.api.task_link(task_id),
        });
    }

    fn report_still_running(&self, task_id: &TaskId) {
        self.push(Notification::StillRunning {
            task_id: task_id.clone(),
            details_url: self.api.task_link(task_id),
        });
    }

    fn report_status_unknown(&self, task_id: &TaskId) {
        self.push(Notification::StatusUnknown {
            task_id: task_id.clone(),
            details_url: self.api.task_link(task_id),
        });
    }
}
