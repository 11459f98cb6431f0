use anyhow::{bail, Context};
use tracing::info;

use xrepl_core::{normalize, TableDescriptor, XreplConfig};
use xrepl_editor::EditorError;
use xrepl_task::TaskResult;

use super::{flush_notifications, open_session};

/// Parsed `xrepl add` arguments.
#[derive(Debug, Clone)]
pub struct AddRequest {
    pub group: String,
    pub tables: Vec<String>,
    pub all: bool,
    pub search: Option<String>,
    pub wait: bool,
}

pub async fn add(config: XreplConfig, request: AddRequest) -> anyhow::Result<()> {
    let (mut session, mut notifications) = open_session(&config, &request.group).await?;

    if let Some(query) = &request.search {
        session.set_search(query);
    }
    if request.all {
        session.toggle_all_visible(true);
    }
    let eligible = session.eligible();
    for id in &request.tables {
        let table = find_eligible(&eligible, id)
            .with_context(|| format!("table {id} is not eligible for group {}", request.group))?;
        session.toggle_row(&table.id, true);
    }

    let selected = session.selection().len();
    let task_id = match session.submit().await {
        Ok(task_id) => task_id,
        Err(EditorError::NothingSelected) => bail!("no tables selected; use --table or --all"),
        Err(e) => {
            flush_notifications(&mut notifications);
            return Err(e.into());
        }
    };
    println!(
        "Submitted {selected} table(s). Task: {}",
        config.api.task_link(&task_id)
    );

    if !request.wait {
        if let Some(pending) = session.close() {
            pending.abandon();
        }
        return Ok(());
    }

    let outcome = session.wait_for_task().await;
    flush_notifications(&mut notifications);
    match outcome.map(|o| o.result) {
        Some(TaskResult::Succeeded) => {
            info!(task = %task_id, "membership update complete");
            println!("✓ Added {selected} table(s) to {}", session.group().name);
            Ok(())
        }
        Some(TaskResult::Failed) => bail!("task {task_id} failed"),
        Some(TaskResult::StatusUnknown) => bail!("status of task {task_id} could not be read"),
        Some(TaskResult::StoppedWatching) | None => Ok(()),
    }
}

/// Look up `id` among the eligible tables, ignoring separators.
fn find_eligible<'a>(eligible: &'a [TableDescriptor], id: &str) -> Option<&'a TableDescriptor> {
    let wanted = normalize(id);
    eligible.iter().find(|t| t.normalized_id() == wanted)
}
