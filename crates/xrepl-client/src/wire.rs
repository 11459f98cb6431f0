//! JSON payloads exchanged with the platform, and their mapping onto the
//! xrepl domain types.

use serde::{Deserialize, Serialize};

use xrepl_core::{ReplicationGroup, TableDescriptor, TableType, TaskStatus};

/// `tableType` value of relational tables.
const SQL_TABLE_TYPE: &str = "PGSQL_TABLE_TYPE";

/// One entry of the universe tables listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTable {
    #[serde(rename = "tableUUID")]
    pub table_uuid: String,
    pub table_name: String,
    pub table_type: String,
    #[serde(default)]
    pub key_space: String,
    #[serde(default)]
    pub size_bytes: f64,
}

impl From<WireTable> for TableDescriptor {
    fn from(t: WireTable) -> Self {
        let table_type = if t.table_type == SQL_TABLE_TYPE {
            TableType::Sql
        } else {
            TableType::Query
        };
        TableDescriptor {
            id: t.table_uuid,
            name: t.table_name,
            table_type,
            keyspace: t.key_space,
            size_bytes: t.size_bytes.max(0.0) as u64,
        }
    }
}

/// Replication group as returned by the xcluster config endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireGroup {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "sourceUniverseUUID")]
    pub source_universe_uuid: String,
    #[serde(rename = "targetUniverseUUID", default)]
    pub target_universe_uuid: String,
    #[serde(default)]
    pub tables: Vec<String>,
}

impl From<WireGroup> for ReplicationGroup {
    fn from(g: WireGroup) -> Self {
        ReplicationGroup::new(
            &g.uuid,
            &g.name,
            &g.source_universe_uuid,
            &g.target_universe_uuid,
            g.tables,
        )
    }
}

/// Body of the membership update: the complete table set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEdit {
    pub tables: Vec<String>,
}

/// Response to an accepted update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTaskAccepted {
    #[serde(rename = "taskUUID")]
    pub task_uuid: String,
}

/// Task progress payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTaskProgress {
    pub status: String,
    #[serde(default)]
    pub percent: f64,
}

impl WireTaskProgress {
    pub fn task_status(&self) -> TaskStatus {
        match self.status.as_str() {
            "Failed" | "Failure" | "Aborted" => TaskStatus::Failed,
            "Success" => TaskStatus::Succeeded,
            _ if self.percent >= 100.0 => TaskStatus::Succeeded,
            _ => TaskStatus::Running,
        }
    }
}

/// Pull the operator-facing message out of an error response body.
pub fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("error") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::from_utf8_lossy(body).into_owned(),
        },
        _ => String::from_utf8_lossy(body).trim().to_string(),
    }
}
