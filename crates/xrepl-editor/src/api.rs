//! Replication API seam.
//!
//! The HTTP plumbing lives in `xrepl-client`; the editor only sees this
//! trait (plus `xrepl_task::StatusSource` for task status), so tests can
//! inject in-process fakes.

use std::future::Future;
use std::pin::Pin;

use xrepl_core::{ApiResult, MembershipUpdate, ReplicationGroup, TableDescriptor, TaskAccepted};

/// Boxed future alias for replication API calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 'a>>;

/// Calls the editor makes against the platform.
pub trait ReplicationApi: Send + Sync {
    /// List every table in the given cluster's catalog.
    fn fetch_tables<'a>(&'a self, cluster_id: &'a str) -> ApiFuture<'a, Vec<TableDescriptor>>;

    /// Load the authoritative state of a replication group.
    fn fetch_group<'a>(&'a self, group_id: &'a str) -> ApiFuture<'a, ReplicationGroup>;

    /// Replace a group's member tables. Returns the task tracking the change.
    fn update_membership<'a>(&'a self, update: &'a MembershipUpdate)
    -> ApiFuture<'a, TaskAccepted>;
}
