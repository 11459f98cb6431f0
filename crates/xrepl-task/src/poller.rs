//! Task poller — background task that watches one server task.
//!
//! `TaskPoller::spawn` starts a tokio task that queries the task status
//! until the [`TaskTracker`] produces an outcome. The outcome is handed to
//! the optional completion callback and then to the [`PendingTask`] handle
//! over a oneshot channel. Both consume their sender side, so neither can
//! fire twice.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use xrepl_core::{ApiResult, PollConfig, TaskId, TaskStatus};

use crate::tracker::{TaskOutcome, TaskTracker};

/// Boxed future returned by [`StatusSource::task_status`].
pub type StatusFuture<'a> = Pin<Box<dyn Future<Output = ApiResult<TaskStatus>> + Send + 'a>>;

/// Future returned by a [`CompletionCallback`].
pub type CompletionFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback invoked once when watching a task ends.
pub type CompletionCallback = Box<dyn FnOnce(TaskOutcome) -> CompletionFuture + Send>;

/// Where task status comes from.
pub trait StatusSource: Send + Sync {
    /// Query the current status of `task_id`.
    fn task_status<'a>(&'a self, task_id: &'a str) -> StatusFuture<'a>;
}

/// Spawns watchers for server tasks.
pub struct TaskPoller<S> {
    source: Arc<S>,
    config: PollConfig,
}

impl<S: StatusSource + 'static> TaskPoller<S> {
    /// Create a poller querying `source`, paced by `config`.
    pub fn new(source: Arc<S>, config: PollConfig) -> Self {
        Self { source, config }
    }

    /// Start watching `task_id`.
    ///
    /// `on_complete` runs inside the watcher before the outcome is sent to
    /// the returned handle, so anything it does happens-before `wait()`
    /// returns.
    pub fn spawn(&self, task_id: &str, on_complete: Option<CompletionCallback>) -> PendingTask {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(TaskStatus::Running);
        let (done_tx, done_rx) = oneshot::channel();

        let tracker = TaskTracker::new(task_id, &self.config);
        let source = self.source.clone();

        let handle = tokio::spawn(async move {
            run_poll_loop(tracker, source, on_complete, status_tx, done_tx, shutdown_rx).await;
        });

        info!(task = %task_id, "watching task");

        PendingTask {
            task_id: task_id.to_string(),
            status: status_rx,
            handle,
            shutdown_tx,
            done_rx,
        }
    }
}

/// Handle to one outstanding task.
///
/// Dropping the handle abandons the watcher: no further queries, no
/// callback. The server-side task is unaffected.
pub struct PendingTask {
    task_id: TaskId,
    status: watch::Receiver<TaskStatus>,
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    done_rx: oneshot::Receiver<TaskOutcome>,
}

impl PendingTask {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Last status observed by the watcher.
    pub fn status(&self) -> TaskStatus {
        *self.status.borrow()
    }

    /// Whether the watcher has exited (outcome delivered or abandoned).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the outcome. `None` if the watcher was stopped before one
    /// was produced.
    pub async fn wait(self) -> Option<TaskOutcome> {
        let PendingTask {
            shutdown_tx,
            done_rx,
            ..
        } = self;
        let outcome = done_rx.await.ok();
        drop(shutdown_tx);
        outcome
    }

    /// Stop watching. The callback will not run.
    pub fn abandon(self) {
        let _ = self.shutdown_tx.send(true);
        debug!(task = %self.task_id, "task watcher abandoned");
    }

    /// Let the watcher run to completion without holding the handle.
    pub fn detach(self) {
        let PendingTask {
            task_id,
            handle,
            shutdown_tx,
            ..
        } = self;
        debug!(task = %task_id, "task watcher detached");
        tokio::spawn(async move {
            // Keep the shutdown sender alive until the watcher exits.
            let _shutdown_tx = shutdown_tx;
            let _ = handle.await;
        });
    }
}

/// The polling loop for a single task.
async fn run_poll_loop<S: StatusSource>(
    mut tracker: TaskTracker,
    source: Arc<S>,
    on_complete: Option<CompletionCallback>,
    status_tx: watch::Sender<TaskStatus>,
    done_tx: oneshot::Sender<TaskOutcome>,
    mut shutdown: watch::Receiver<bool>,
) {
    let task_id = tracker.task_id().to_string();
    debug!(task = %task_id, "poll loop starting");

    let outcome = loop {
        let interval = tracker.next_interval();
        let query = async {
            tokio::time::sleep(interval).await;
            source.task_status(&task_id).await
        };

        tokio::select! {
            result = query => {
                if let Some(outcome) = tracker.record(result) {
                    break outcome;
                }
                let _ = status_tx.send(tracker.status());
            }
            _ = shutdown.changed() => {
                debug!(task = %task_id, "poll loop shutting down");
                return;
            }
        }
    };

    let _ = status_tx.send(tracker.status());
    if let Some(cb) = on_complete {
        cb(outcome.clone()).await;
    }
    let _ = done_tx.send(outcome);
}
