//! Error types for the editor session.

use thiserror::Error;

use xrepl_core::{ApiError, CatalogFetchError, SubmissionError, TaskId};

/// Result type alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors surfaced by [`crate::EditorSession`].
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to load replication group {group}: {cause}")]
    Group { group: String, cause: ApiError },

    #[error(transparent)]
    Catalog(#[from] CatalogFetchError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("task {0} is still pending")]
    TaskInFlight(TaskId),

    #[error("no tables selected")]
    NothingSelected,
}
