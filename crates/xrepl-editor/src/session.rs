//! Editor session — one operator editing one replication group.
//!
//! The session exclusively owns the catalog snapshot, the selection, the
//! search text and the pending task. Nothing else mutates them. At most one
//! membership update may be in flight: `submit` is rejected until the
//! previous task's watcher has finished.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use xrepl_core::*;
use xrepl_task::{
    CompletionCallback, CompletionFuture, PendingTask, StatusSource, TaskOutcome, TaskPoller,
    TaskResult,
};

use crate::api::ReplicationApi;
use crate::cache::{CacheInvalidator, CacheKey, GroupCache};
use crate::error::{EditorError, EditorResult};
use crate::reporter::ErrorReporter;
use crate::submitter::ChangeSubmitter;

/// One operator's edit of one replication group.
///
/// Holds the group and catalog snapshots, the selection, the search text
/// and at most one watched task. After a watched task ends the group
/// snapshot is re-read before it is used again.
pub struct EditorSession<A> {
    api: Arc<A>,
    cache: Arc<GroupCache>,
    reporter: Arc<dyn ErrorReporter>,
    submitter: ChangeSubmitter<A>,
    poller: TaskPoller<A>,
    group: ReplicationGroup,
    catalog: Vec<TableDescriptor>,
    selection: SelectionTracker,
    search: String,
    pending: Option<PendingTask>,
    /// Set when a watched task has ended and `group` may be out of date.
    group_stale: bool,
}

impl<A: ReplicationApi + StatusSource + 'static> EditorSession<A> {
    /// Open the editor for `group_id`.
    ///
    /// Loads the group through the cache and the source catalog from the
    /// API. A catalog failure is fatal: no session is returned.
    pub async fn open(
        api: Arc<A>,
        cache: Arc<GroupCache>,
        reporter: Arc<dyn ErrorReporter>,
        poll: PollConfig,
        group_id: &str,
    ) -> EditorResult<Self> {
        let group = cache
            .get_group(group_id, api.as_ref())
            .await
            .map_err(|cause| EditorError::Group {
                group: group_id.to_string(),
                cause,
            })?;
        let catalog = fetch_catalog(api.as_ref(), &group.source_cluster_id).await?;

        info!(
            group = %group.id,
            members = group.member_table_ids.len(),
            catalog = catalog.len(),
            "editor session opened"
        );

        Ok(Self {
            submitter: ChangeSubmitter::new(api.clone()),
            poller: TaskPoller::new(api.clone(), poll),
            api,
            cache,
            reporter,
            group,
            catalog,
            selection: SelectionTracker::new(),
            search: String::new(),
            pending: None,
            group_stale: false,
        })
    }

    pub fn group(&self) -> &ReplicationGroup {
        &self.group
    }

    pub fn catalog(&self) -> &[TableDescriptor] {
        &self.catalog
    }

    /// Re-fetch the source catalog. The old snapshot is kept on failure.
    pub async fn refresh_catalog(&mut self) -> Result<(), CatalogFetchError> {
        self.catalog = fetch_catalog(self.api.as_ref(), &self.group.source_cluster_id).await?;
        debug!(group = %self.group.id, catalog = self.catalog.len(), "catalog refreshed");
        Ok(())
    }

    /// Re-read the group through the cache and drop selected tables that
    /// are now members.
    pub async fn refresh_group(&mut self) -> EditorResult<()> {
        let group_id = self.group.id.clone();
        self.group = self
            .cache
            .get_group(&group_id, self.api.as_ref())
            .await
            .map_err(|cause| EditorError::Group {
                group: group_id.clone(),
                cause,
            })?;
        self.group_stale = false;
        self.selection.remove_members(&self.group.member_table_ids);
        debug!(
            group = %self.group.id,
            members = self.group.member_table_ids.len(),
            "group refreshed"
        );
        Ok(())
    }

    /// Catalog tables not yet replicated.
    pub fn eligible(&self) -> Vec<TableDescriptor> {
        eligible_tables(&self.catalog, &self.group.member_table_ids)
    }

    /// Eligible tables matching the current search text.
    pub fn visible(&self) -> Vec<TableDescriptor> {
        apply_search(&self.eligible(), &self.search)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    pub fn toggle_row(&mut self, id: &str, selected: bool) {
        self.selection.toggle_row(id, selected);
    }

    /// "Select all" over the currently visible rows.
    ///
    /// Checking replaces the selection, so rows selected earlier but
    /// hidden by the filter are dropped.
    pub fn toggle_all_visible(&mut self, selected: bool) {
        let visible: Vec<TableId> = self.visible().into_iter().map(|t| t.id).collect();
        self.selection.toggle_all(visible, selected);
    }

    pub fn selection(&self) -> BTreeSet<TableId> {
        self.selection.current_selection()
    }

    pub fn pending_task(&self) -> Option<&PendingTask> {
        self.pending.as_ref()
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        self.pending.as_ref().is_none_or(|p| p.is_finished())
    }

    /// Submit the selection as a membership update and start watching the
    /// resulting task.
    ///
    /// On failure the selection is left intact and the error is reported.
    pub async fn submit(&mut self) -> EditorResult<TaskId> {
        if let Some(pending) = &self.pending {
            if !pending.is_finished() {
                return Err(EditorError::TaskInFlight(pending.task_id().clone()));
            }
        }
        if self.pending.take().is_some() {
            self.group_stale = true;
        }
        // The update replaces the whole member set, so it must be built on
        // the membership the finished task left behind.
        if self.group_stale {
            self.refresh_group().await?;
        }
        if self.selection.is_empty() {
            return Err(EditorError::NothingSelected);
        }

        let selection = self.selection.current_selection();
        let accepted = match self.submitter.submit(&self.group, &selection).await {
            Ok(accepted) => accepted,
            Err(e) => {
                self.reporter.report_submission_failure(&e);
                return Err(e.into());
            }
        };

        let callback = completion_callback(
            self.cache.clone(),
            self.reporter.clone(),
            self.group.id.clone(),
        );
        self.pending = Some(self.poller.spawn(&accepted.task_id, Some(callback)));
        Ok(accepted.task_id)
    }

    /// Wait for the pending task, if any, to finish.
    ///
    /// Once watching ends the group is re-read, so `eligible()` no longer
    /// lists the tables just added. If that read fails the next `submit`
    /// retries it.
    pub async fn wait_for_task(&mut self) -> Option<TaskOutcome> {
        let outcome = self.pending.take()?.wait().await;
        self.group_stale = true;
        if let Err(e) = self.refresh_group().await {
            warn!(group = %self.group.id, error = %e, "group refresh failed");
        }
        outcome
    }

    /// Tear the session down.
    ///
    /// Selection and search are discarded. An in-flight task watcher is
    /// handed back: the caller can wait on it, detach it, or drop it to
    /// stop watching. The server task continues either way.
    pub fn close(mut self) -> Option<PendingTask> {
        self.selection.clear();
        self.search.clear();
        info!(group = %self.group.id, "editor session closed");
        self.pending.take()
    }
}

async fn fetch_catalog<A: ReplicationApi>(
    api: &A,
    cluster_id: &str,
) -> Result<Vec<TableDescriptor>, CatalogFetchError> {
    api.fetch_tables(cluster_id)
        .await
        .map_err(|cause| CatalogFetchError {
            cluster: cluster_id.to_string(),
            cause,
        })
}

/// What happens when a watched task ends.
///
/// Terminal outcomes invalidate the cached group whether or not the task
/// failed; a failed task may have applied part of the change.
fn completion_callback(
    cache: Arc<GroupCache>,
    reporter: Arc<dyn ErrorReporter>,
    group_id: GroupId,
) -> CompletionCallback {
    Box::new(move |outcome: TaskOutcome| -> CompletionFuture {
        Box::pin(async move {
            match outcome.result {
                TaskResult::Succeeded => {
                    cache.invalidate(&CacheKey::group(&group_id)).await;
                    info!(group = %group_id, task = %outcome.task_id, "tables added");
                }
                TaskResult::Failed => {
                    cache.invalidate(&CacheKey::group(&group_id)).await;
                    reporter.report_task_failure(&outcome.task_id);
                }
                TaskResult::StoppedWatching => {
                    reporter.report_still_running(&outcome.task_id);
                }
                TaskResult::StatusUnknown => {
                    reporter.report_status_unknown(&outcome.task_id);
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{group, table, MockApi};
    use crate::reporter::{ChannelReporter, Notification};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn catalog() -> Vec<TableDescriptor> {
        vec![
            table("a-1", "orders"),
            table("b-2", "users"),
            table("c-3", "orderlines"),
        ]
    }

    fn poll_config() -> PollConfig {
        PollConfig {
            interval: "1s".to_string(),
            max_backoff: "4s".to_string(),
            max_attempts: 10,
        }
    }

    struct Fixture {
        api: Arc<MockApi>,
        cache: Arc<GroupCache>,
        notifications: mpsc::UnboundedReceiver<Notification>,
        session: EditorSession<MockApi>,
    }

    async fn open_with(api: MockApi) -> Fixture {
        let api = Arc::new(api);
        let cache = Arc::new(GroupCache::new());
        let (reporter, notifications) =
            ChannelReporter::new(XreplConfig::new("http://platform:9000", "c-1").api);
        let session = EditorSession::open(
            api.clone(),
            cache.clone(),
            Arc::new(reporter),
            poll_config(),
            "group-1",
        )
        .await
        .unwrap();
        Fixture {
            api,
            cache,
            notifications,
            session,
        }
    }

    async fn open() -> Fixture {
        open_with(MockApi::new(group(&["a1"]), catalog())).await
    }

    fn names(tables: Vec<TableDescriptor>) -> Vec<String> {
        tables.into_iter().map(|t| t.name).collect()
    }

    #[tokio::test]
    async fn open_excludes_replicated_tables() {
        let f = open().await;
        assert_eq!(names(f.session.eligible()), vec!["users", "orderlines"]);
        assert!(f.session.selection().is_empty());
    }

    #[tokio::test]
    async fn catalog_failure_is_fatal_to_open() {
        let api = MockApi::new(group(&["a1"]), vec![]);
        *api.tables.lock().unwrap() = Err(ApiError::Transport("refused".to_string()));
        let (reporter, _rx) = ChannelReporter::new(XreplConfig::new("http://p:1", "c").api);

        let result = EditorSession::open(
            Arc::new(api),
            Arc::new(GroupCache::new()),
            Arc::new(reporter),
            poll_config(),
            "group-1",
        )
        .await;
        match result {
            Err(EditorError::Catalog(e)) => assert_eq!(e.cluster, "source-1"),
            Err(other) => panic!("expected catalog error, got {other}"),
            Ok(_) => panic!("expected catalog error"),
        }
    }

    #[tokio::test]
    async fn search_filters_visible_rows() {
        let mut f = open_with(MockApi::new(group(&[]), catalog())).await;
        f.session.set_search("ORD");
        assert_eq!(names(f.session.visible()), vec!["orders", "orderlines"]);
        f.session.set_search("");
        assert_eq!(f.session.visible().len(), 3);
    }

    #[tokio::test]
    async fn select_all_under_filter_replaces_selection() {
        let mut f = open().await;
        f.session.toggle_row("b-2", true);
        f.session.set_search("order");
        f.session.toggle_all_visible(true);
        assert_eq!(f.session.selection(), BTreeSet::from(["c3".to_string()]));

        f.session.toggle_all_visible(false);
        assert!(f.session.selection().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_sends_union_and_invalidates_on_success() {
        let mut f = open().await;
        f.api.script_statuses(vec![Ok(TaskStatus::Running), Ok(TaskStatus::Succeeded)]);
        f.session.toggle_row("b-2", true);

        let task_id = f.session.submit().await.unwrap();
        assert_eq!(task_id, "task-1");
        assert_eq!(
            f.api.last_update().unwrap().tables,
            BTreeSet::from(["a1".to_string(), "b2".to_string()])
        );
        assert!(!f.session.can_submit());

        let outcome = f.session.wait_for_task().await.unwrap();
        assert_eq!(outcome.result, TaskResult::Succeeded);
        // Invalidated by the completion, then re-read by wait_for_task.
        assert_eq!(f.api.group_fetches(), 2);
        assert_eq!(f.cache.is_stale(&CacheKey::group("group-1")).await, Some(false));
        assert!(f.notifications.try_recv().is_err());
        assert!(f.session.can_submit());
    }

    #[tokio::test]
    async fn submit_failure_keeps_selection_and_reports() {
        let mut f = open().await;
        *f.api.update_result.lock().unwrap() = Err(ApiError::Transport("refused".to_string()));
        f.session.toggle_row("b-2", true);

        let err = f.session.submit().await.unwrap_err();
        assert!(matches!(err, EditorError::Submission(_)));
        assert_eq!(f.session.selection(), BTreeSet::from(["b2".to_string()]));
        assert!(f.session.pending_task().is_none());
        assert!(matches!(
            f.notifications.try_recv().unwrap(),
            Notification::SubmissionFailed { .. }
        ));
        assert_eq!(f.api.status_queries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn task_failure_invalidates_reports_and_stops_polling() {
        let mut f = open().await;
        f.api.script_statuses(vec![
            Ok(TaskStatus::Running),
            Ok(TaskStatus::Failed),
            Ok(TaskStatus::Failed),
        ]);
        f.session.toggle_row("c-3", true);
        f.session.submit().await.unwrap();

        let outcome = f.session.wait_for_task().await.unwrap();
        assert!(outcome.failed());
        assert_eq!(f.api.group_fetches(), 2);
        assert_eq!(
            f.notifications.try_recv().unwrap(),
            Notification::TaskFailed {
                task_id: "task-1".to_string(),
                details_url: "http://platform:9000/tasks/task-1".to_string(),
            }
        );

        let queries = f.api.status_queries();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.api.status_queries(), queries);
        assert!(f.notifications.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_rejected_while_pending() {
        let mut f = open().await;
        f.api.script_statuses(vec![Ok(TaskStatus::Running)]);
        f.session.toggle_row("b-2", true);
        f.session.submit().await.unwrap();

        let err = f.session.submit().await.unwrap_err();
        assert!(matches!(err, EditorError::TaskInFlight(ref id) if id == "task-1"));
        assert_eq!(f.api.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_selection_is_not_submitted() {
        let mut f = open().await;
        let err = f.session.submit().await.unwrap_err();
        assert!(matches!(err, EditorError::NothingSelected));
        assert!(f.api.last_update().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_watching_reports_without_invalidating() {
        let mut f = open().await;
        f.api.script_statuses(vec![Ok(TaskStatus::Running)]);
        f.session.toggle_row("b-2", true);
        f.session.submit().await.unwrap();

        let outcome = f.session.wait_for_task().await.unwrap();
        assert_eq!(outcome.result, TaskResult::StoppedWatching);
        assert_eq!(outcome.attempts, 10);
        assert_eq!(f.cache.is_stale(&CacheKey::group("group-1")).await, Some(false));
        assert!(matches!(
            f.notifications.try_recv().unwrap(),
            Notification::StillRunning { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn close_hands_back_pending_task() {
        let mut f = open().await;
        f.api.script_statuses(vec![Ok(TaskStatus::Running), Ok(TaskStatus::Succeeded)]);
        f.session.toggle_row("b-2", true);
        f.session.set_search("users");
        f.session.submit().await.unwrap();

        let pending = f.session.close().unwrap();
        let outcome = pending.wait().await.unwrap();
        assert_eq!(outcome.result, TaskResult::Succeeded);
        assert_eq!(f.cache.is_stale(&CacheKey::group("group-1")).await, Some(true));
    }

    #[tokio::test]
    async fn reopen_after_invalidation_sees_new_membership() {
        let f = open().await;
        f.cache.invalidate(&CacheKey::group("group-1")).await;
        *f.api.group.lock().unwrap() = group(&["a1", "b2"]);

        let (reporter, _rx) = ChannelReporter::new(XreplConfig::new("http://p:1", "c").api);
        let session = EditorSession::open(
            f.api.clone(),
            f.cache.clone(),
            Arc::new(reporter),
            poll_config(),
            "group-1",
        )
        .await
        .unwrap();
        assert_eq!(names(session.eligible()), vec!["orderlines"]);
    }

    #[tokio::test]
    async fn refresh_catalog_picks_up_new_tables() {
        let mut f = open().await;
        let mut tables = catalog();
        tables.push(table("d-4", "invoices"));
        *f.api.tables.lock().unwrap() = Ok(tables);

        f.session.refresh_catalog().await.unwrap();
        assert_eq!(f.api.table_fetches(), 2);
        assert_eq!(f.session.catalog().len(), 4);
        assert!(names(f.session.eligible()).contains(&"invoices".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_after_success_keeps_added_tables() {
        let mut f = open().await;
        f.session.toggle_row("b-2", true);
        f.session.submit().await.unwrap();
        // The server applies the first update.
        *f.api.group.lock().unwrap() = group(&["a1", "b2"]);

        let outcome = f.session.wait_for_task().await.unwrap();
        assert_eq!(outcome.result, TaskResult::Succeeded);
        assert_eq!(names(f.session.eligible()), vec!["orderlines"]);
        assert!(f.session.selection().is_empty());

        f.session.toggle_row("c-3", true);
        f.session.submit().await.unwrap();
        assert_eq!(
            f.api.last_update().unwrap().tables,
            BTreeSet::from(["a1".to_string(), "b2".to_string(), "c3".to_string()])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_without_waiting_rereads_group() {
        let mut f = open().await;
        f.session.toggle_row("b-2", true);
        f.session.submit().await.unwrap();
        *f.api.group.lock().unwrap() = group(&["a1", "b2"]);

        // Let the watcher finish in the background.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(f.session.can_submit());

        f.session.toggle_row("b-2", false);
        f.session.toggle_row("c-3", true);
        f.session.submit().await.unwrap();

        let sent = f.api.last_update().unwrap().tables;
        assert!(sent.contains("b2"), "b2 dropped from membership: {sent:?}");
        assert_eq!(
            sent,
            BTreeSet::from(["a1".to_string(), "b2".to_string(), "c3".to_string()])
        );
        assert_eq!(names(f.session.eligible()), vec!["orderlines"]);
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_of_now_replicated_table_is_empty() {
        let mut f = open().await;
        f.session.toggle_row("b-2", true);
        f.session.submit().await.unwrap();
        *f.api.group.lock().unwrap() = group(&["a1", "b2"]);
        tokio::time::sleep(Duration::from_secs(5)).await;

        // b-2 is still checked, but it is a member now.
        let err = f.session.submit().await.unwrap_err();
        assert!(matches!(err, EditorError::NothingSelected));
        assert_eq!(f.api.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_status_reports_and_stops_polling() {
        let mut f = open().await;
        f.api.script_statuses(vec![
            Ok(TaskStatus::Running),
            Err(ApiError::Decode("expected value".to_string())),
        ]);
        f.session.toggle_row("b-2", true);
        f.session.submit().await.unwrap();

        let outcome = f.session.wait_for_task().await.unwrap();
        assert_eq!(outcome.result, TaskResult::StatusUnknown);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(
            f.notifications.try_recv().unwrap(),
            Notification::StatusUnknown {
                task_id: "task-1".to_string(),
                details_url: "http://platform:9000/tasks/task-1".to_string(),
            }
        );
    }
}
