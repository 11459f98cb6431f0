//! Membership diff — which catalog tables can still be added.

use std::collections::BTreeSet;

use crate::types::{TableDescriptor, TableId};

/// Catalog tables whose normalized id is not already replicated.
///
/// Catalog order is preserved.
pub fn eligible_tables(
    catalog: &[TableDescriptor],
    replicated_ids: &BTreeSet<TableId>,
) -> Vec<TableDescriptor> {
    catalog
        .iter()
        .filter(|t| !replicated_ids.contains(&t.normalized_id()))
        .cloned()
        .collect()
}

/// Filter by case-insensitive substring match on the table name.
///
/// An empty query returns the input unchanged.
pub fn apply_search(eligible: &[TableDescriptor], query: &str) -> Vec<TableDescriptor> {
    if query.is_empty() {
        return eligible.to_vec();
    }
    let needle = query.to_lowercase();
    eligible
        .iter()
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
