//! Client-side cache of replication group snapshots.
//!
//! Entries are keyed by `(EntityKind, id)`. Invalidation does not drop the
//! snapshot, it marks it stale; the next read goes back to the server.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;
use tracing::debug;

use xrepl_core::{ApiResult, ReplicationGroup};

use crate::api::ReplicationApi;

/// Kind of entity a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ReplicationGroup,
}

/// Cache key: entity kind plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub id: String,
}

impl CacheKey {
    pub fn group(group_id: &str) -> Self {
        Self {
            kind: EntityKind::ReplicationGroup,
            id: group_id.to_string(),
        }
    }
}

/// Marks cached state stale after a mutation.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate<'a>(&'a self, key: &'a CacheKey) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

struct CacheEntry {
    group: ReplicationGroup,
    stale: bool,
}

/// In-memory group cache shared by editor sessions.
#[derive(Default)]
pub struct GroupCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl GroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached group, re-fetching if it is missing or stale.
    pub async fn get_group<A: ReplicationApi>(
        &self,
        group_id: &str,
        api: &A,
    ) -> ApiResult<ReplicationGroup> {
        let key = CacheKey::group(group_id);
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if !entry.stale {
                    return Ok(entry.group.clone());
                }
            }
        }

        debug!(group = %group_id, "fetching replication group");
        let group = api.fetch_group(group_id).await?;
        self.put_group(group.clone()).await;
        Ok(group)
    }

    /// Store a fresh snapshot.
    pub async fn put_group(&self, group: ReplicationGroup) {
        let key = CacheKey::group(&group.id);
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { group, stale: false });
    }

    /// `Some(true)` if the entry exists and is stale, `None` if absent.
    pub async fn is_stale(&self, key: &CacheKey) -> Option<bool> {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| e.stale)
    }
}

impl CacheInvalidator for GroupCache {
    fn invalidate<'a>(&'a self, key: &'a CacheKey) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.get_mut(key) {
                entry.stale = true;
            }
            debug!(kind = ?key.kind, id = %key.id, "cache entry invalidated");
        })
    }
}
