//! Table identifier normalization.
//!
//! The catalog hands out UUID-style ids with hyphens (`a1b2-c3d4`) while
//! replication membership stores the same ids without them (`a1b2c3d4`).
//! Every set comparison between the two goes through [`normalize`].

/// Characters stripped from identifiers.
const SEPARATORS: &[char] = &['-'];

/// Remove all separator characters from `id`.
///
/// Pure, total, and idempotent.
pub fn normalize(id: &str) -> String {
    id.chars().filter(|c| !SEPARATORS.contains(c)).collect()
}
