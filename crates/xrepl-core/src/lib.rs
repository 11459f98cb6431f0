//! xrepl-core — the pure half of the replication membership editor.
//!
//! Everything in this crate is synchronous and free of I/O: identifier
//! normalization, the diff between a source catalog and the current
//! replication membership, the operator's selection set, plus the shared
//! domain types, errors, and the `xrepl.toml` configuration.
//!
//! # Components
//!
//! - **`normalize`** — separator-stripping for table identifiers
//! - **`diff`** — eligible tables and search filtering
//! - **`selection`** — the mutable set of checked table ids
//! - **`config`** — `xrepl.toml` parsing and duration strings
//! - **`types`** / **`error`** — domain types and error enums

pub mod config;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod selection;
pub mod types;

pub use config::{ApiConfig, PollConfig, XreplConfig};
pub use diff::{apply_search, eligible_tables};
pub use error::{ApiError, ApiResult, CatalogFetchError, ConfigError, SubmissionError};
pub use normalize::normalize;
pub use selection::SelectionTracker;
pub use types::*;
