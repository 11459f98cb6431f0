//! In-process fake of the replication API for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use xrepl_core::*;
use xrepl_task::{StatusFuture, StatusSource};

use crate::api::{ApiFuture, ReplicationApi};

pub(crate) struct MockApi {
    pub tables: Mutex<ApiResult<Vec<TableDescriptor>>>,
    pub group: Mutex<ReplicationGroup>,
    pub update_result: Mutex<ApiResult<TaskAccepted>>,
    pub updates: Mutex<Vec<MembershipUpdate>>,
    /// Scripted task statuses; the last one repeats.
    pub statuses: Mutex<VecDeque<ApiResult<TaskStatus>>>,
    pub status_queries: AtomicU32,
    pub group_fetches: AtomicU32,
    pub table_fetches: AtomicU32,
}

impl MockApi {
    pub fn new(group: ReplicationGroup, tables: Vec<TableDescriptor>) -> Self {
        Self {
            tables: Mutex::new(Ok(tables)),
            group: Mutex::new(group),
            update_result: Mutex::new(Ok(TaskAccepted {
                task_id: "task-1".to_string(),
            })),
            updates: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::from([Ok(TaskStatus::Succeeded)])),
            status_queries: AtomicU32::new(0),
            group_fetches: AtomicU32::new(0),
            table_fetches: AtomicU32::new(0),
        }
    }

    pub fn script_statuses(&self, script: Vec<ApiResult<TaskStatus>>) {
        *self.statuses.lock().unwrap() = script.into();
    }

    pub fn status_queries(&self) -> u32 {
        self.status_queries.load(Ordering::SeqCst)
    }

    pub fn group_fetches(&self) -> u32 {
        self.group_fetches.load(Ordering::SeqCst)
    }

    pub fn table_fetches(&self) -> u32 {
        self.table_fetches.load(Ordering::SeqCst)
    }

    pub fn last_update(&self) -> Option<MembershipUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }
}

impl ReplicationApi for MockApi {
    fn fetch_tables<'a>(&'a self, _cluster_id: &'a str) -> ApiFuture<'a, Vec<TableDescriptor>> {
        self.table_fetches.fetch_add(1, Ordering::SeqCst);
        let result = self.tables.lock().unwrap().clone();
        Box::pin(async move { result })
    }

    fn fetch_group<'a>(&'a self, _group_id: &'a str) -> ApiFuture<'a, ReplicationGroup> {
        self.group_fetches.fetch_add(1, Ordering::SeqCst);
        let group = self.group.lock().unwrap().clone();
        Box::pin(async move { Ok(group) })
    }

    fn update_membership<'a>(
        &'a self,
        update: &'a MembershipUpdate,
    ) -> ApiFuture<'a, TaskAccepted> {
        let result = self.update_result.lock().unwrap().clone();
        if result.is_ok() {
            self.updates.lock().unwrap().push(update.clone());
        }
        Box::pin(async move { result })
    }
}

impl StatusSource for MockApi {
    fn task_status<'a>(&'a self, _task_id: &'a str) -> StatusFuture<'a> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let result = if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(Ok(TaskStatus::Running))
        } else {
            statuses.front().cloned().unwrap_or(Ok(TaskStatus::Running))
        };
        Box::pin(async move { result })
    }
}

pub(crate) fn table(id: &str, name: &str) -> TableDescriptor {
    TableDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        table_type: TableType::Sql,
        keyspace: "shop".to_string(),
        size_bytes: 4096,
    }
}

pub(crate) fn group(members: &[&str]) -> ReplicationGroup {
    ReplicationGroup::new("group-1", "shop-sync", "source-1", "target-1", members)
}
