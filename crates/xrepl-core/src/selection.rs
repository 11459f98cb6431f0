//! Selection state — the table ids the operator has checked.
//!
//! Ids are normalized on the way in, so callers can pass catalog ids
//! directly. "Select all" replaces the set rather than extending it: it
//! applies to whatever rows are visible under the current search filter.

use std::collections::BTreeSet;

use tracing::debug;

use crate::normalize::normalize;
use crate::types::TableId;

/// Mutable set of checked table ids, owned by one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<TableId>,
}

impl SelectionTracker {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check or uncheck a single row.
    pub fn toggle_row(&mut self, id: &str, selected: bool) {
        let id = normalize(id);
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
        debug!(selected = self.selected.len(), "row toggled");
    }

    /// Check or uncheck every row in `ids`.
    ///
    /// Checking replaces the set with exactly `ids`; unchecking clears it.
    pub fn toggle_all<I, S>(&mut self, ids: I, selected: bool)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if selected {
            self.selected = ids.into_iter().map(|id| normalize(id.as_ref())).collect();
        } else {
            self.selected.clear();
        }
        debug!(selected = self.selected.len(), "all rows toggled");
    }

    /// Snapshot of the current selection.
    pub fn current_selection(&self) -> BTreeSet<TableId> {
        self.selected.clone()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(&normalize(id))
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop every selected id that is already in `members` (normalized).
    pub fn remove_members(&mut self, members: &BTreeSet<TableId>) {
        let before = self.selected.len();
        self.selected.retain(|id| !members.contains(id));
        if self.selected.len() != before {
            debug!(selected = self.selected.len(), "selected members dropped");
        }
    }
}
