//! Runner error types

use std::path::PathBuf;
use thiserror::Error;

use shared::SharedError;

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Failure reported by a transport while sending one request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request failed: {message}")]
    Request { message: String },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response body is not JSON: {message}")]
    Decode { message: String },
}

/// Runner error types
///
/// Configuration variants abort the run before any query is dispatched.
/// The remaining variants are caught at the pipeline boundary and reported
/// for the query that produced them.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Template error: {message}")]
    TemplateError { message: String },

    #[error("Invalid path expression '{path}' at position {position}: {reason}")]
    PathSyntax {
        path: String,
        position: usize,
        reason: String,
    },

    #[error("Parallelism must be at least 1, got {value}")]
    InvalidParallelism { value: usize },

    #[error("Cannot resolve request URL '{url}': {reason}")]
    UrlError { url: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Failed to write artifact {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fingerprint failed: {message}")]
    Fingerprint { message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl RunnerError {
    /// True for errors that must stop the run before dispatch
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RunnerError::TemplateError { .. }
                | RunnerError::PathSyntax { .. }
                | RunnerError::InvalidParallelism { .. }
                | RunnerError::UrlError { .. }
                | RunnerError::ConfigError { .. }
                | RunnerError::SharedError(_)
        )
    }
}
