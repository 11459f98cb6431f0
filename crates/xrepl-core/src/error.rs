//! Error types for xrepl.

use thiserror::Error;

use crate::types::ClusterId;

/// Result type alias for calls against the replication API.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by the replication API collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether retrying the same request might succeed.
    ///
    /// Connection failures, timeouts and 5xx responses are transient;
    /// 4xx and undecodable payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Decode(_) => false,
        }
    }
}

/// The source catalog could not be loaded; the editor cannot open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch tables for cluster {cluster}: {cause}")]
pub struct CatalogFetchError {
    pub cluster: ClusterId,
    #[source]
    pub cause: ApiError,
}

/// A membership update was not accepted. Local state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("membership update rejected: {cause}")]
pub struct SubmissionError {
    #[source]
    pub cause: ApiError,
}

impl SubmissionError {
    /// The message shown to the operator.
    pub fn operator_message(&self) -> String {
        match &self.cause {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors loading `xrepl.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
