//! Domain types shared by every xrepl crate.
//!
//! Identifiers are plain strings. Table ids coming from the catalog may
//! carry separators; ids inside a [`ReplicationGroup`] are always stored in
//! normalized form.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Identifier of a table (catalog form or normalized form).
pub type TableId = String;

/// Identifier of a replication group.
pub type GroupId = String;

/// Identifier of a cluster.
pub type ClusterId = String;

/// Server-assigned identifier of a long-running task.
pub type TaskId = String;

// ── Tables ────────────────────────────────────────────────────────

/// Which API a table is exposed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    /// Relational (SQL) table.
    Sql,
    /// Wide-column (query language) table.
    Query,
}

impl TableType {
    /// Short label shown to the operator.
    pub fn label(&self) -> &'static str {
        match self {
            TableType::Sql => "YSQL",
            TableType::Query => "YCQL",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A table as reported by the source cluster's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Catalog identifier; may contain separators.
    pub id: TableId,
    pub name: String,
    pub table_type: TableType,
    pub keyspace: String,
    pub size_bytes: u64,
}

impl TableDescriptor {
    /// The identifier in the form used by replication membership.
    pub fn normalized_id(&self) -> TableId {
        normalize(&self.id)
    }
}

// ── Replication group ─────────────────────────────────────────────

/// Read-only snapshot of a server-owned replication group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationGroup {
    pub id: GroupId,
    pub name: String,
    pub source_cluster_id: ClusterId,
    pub target_cluster_id: ClusterId,
    /// Normalized ids of the tables currently replicated.
    pub member_table_ids: BTreeSet<TableId>,
}

impl ReplicationGroup {
    /// Build a group snapshot, normalizing every member id on the way in.
    pub fn new<I, S>(
        id: &str,
        name: &str,
        source_cluster_id: &str,
        target_cluster_id: &str,
        members: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            source_cluster_id: source_cluster_id.to_string(),
            target_cluster_id: target_cluster_id.to_string(),
            member_table_ids: members.into_iter().map(|m| normalize(m.as_ref())).collect(),
        }
    }

    /// Whether a table (in either id form) is already replicated.
    pub fn contains(&self, table_id: &str) -> bool {
        self.member_table_ids.contains(&normalize(table_id))
    }
}

// ── Tasks ─────────────────────────────────────────────────────────

/// Status of a server-tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// SUCCEEDED and FAILED are terminal; no further transitions occur.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

/// Acknowledgement of an accepted membership update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAccepted {
    pub task_id: TaskId,
}

/// Request to replace a group's member tables.
///
/// `tables` is always the complete desired set, never a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipUpdate {
    pub group_id: GroupId,
    pub tables: BTreeSet<TableId>,
}

/// Render a byte count the way the operator list shows sizes.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_members_are_normalized() {
        let group = ReplicationGroup::new("g1", "orders-sync", "src", "dst", ["a-1", "b2"]);
        let members: Vec<_> = group.member_table_ids.iter().cloned().collect();
        assert_eq!(members, vec!["a1".to_string(), "b2".to_string()]);
        assert!(group.contains("a-1"));
        assert!(group.contains("b2"));
        assert!(!group.contains("c3"));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn table_type_labels() {
        assert_eq!(TableType::Sql.label(), "YSQL");
        assert_eq!(TableType::Query.to_string(), "YCQL");
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }

    #[test]
    fn membership_update_serializes_full_set() {
        let update = MembershipUpdate {
            group_id: "g1".to_string(),
            tables: ["b2", "a1"].iter().map(|s| s.to_string()).collect(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["tables"], serde_json::json!(["a1", "b2"]));
    }
}
