//! Change submitter — sends a group's complete new member set.
//!
//! The update endpoint has replace semantics. The request therefore
//! carries `existing ∪ selected`; sending only the selection would drop
//! every table already under replication.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info};

use xrepl_core::{MembershipUpdate, ReplicationGroup, SubmissionError, TableId, TaskAccepted};

use crate::api::ReplicationApi;

/// `group.member_table_ids ∪ selection`.
pub fn final_membership(
    group: &ReplicationGroup,
    selection: &BTreeSet<TableId>,
) -> BTreeSet<TableId> {
    group.member_table_ids.union(selection).cloned().collect()
}

/// Issues membership updates. Touches no local state.
pub struct ChangeSubmitter<A> {
    api: Arc<A>,
}

impl<A: ReplicationApi> ChangeSubmitter<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Submit `selection` for addition to `group`.
    ///
    /// Acceptance only means the server queued the change; the returned
    /// task id must be watched to learn whether it took effect.
    pub async fn submit(
        &self,
        group: &ReplicationGroup,
        selection: &BTreeSet<TableId>,
    ) -> Result<TaskAccepted, SubmissionError> {
        let update = MembershipUpdate {
            group_id: group.id.clone(),
            tables: final_membership(group, selection),
        };

        match self.api.update_membership(&update).await {
            Ok(accepted) => {
                info!(
                    group = %group.id,
                    task = %accepted.task_id,
                    added = update.tables.len() - group.member_table_ids.len(),
                    total = update.tables.len(),
                    "membership update accepted"
                );
                Ok(accepted)
            }
            Err(cause) => {
                error!(group = %group.id, error = %cause, "membership update rejected");
                Err(SubmissionError { cause })
            }
        }
    }
}
