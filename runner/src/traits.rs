//! Runner trait definitions for dependency injection

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{RunnerResult, TransportError};
use crate::types::Outcome;

/// Network capability shared by every pipeline of a run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON body to `url` and return the decoded JSON response
    async fn send(&self, url: &str, body: &Value) -> Result<Value, TransportError>;
}

/// Destination for persisted artifacts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `contents` to `path`, replacing any previous artifact there
    async fn write(&self, path: &Path, contents: &[u8]) -> RunnerResult<()>;
}

/// Sink for the per-query progress stream
#[cfg_attr(test, mockall::automock)]
pub trait ProgressReporter: Send + Sync {
    /// A query completed with a response
    fn progress(&self, outcome: Outcome, fingerprint: &str, query: &str);

    /// A query's pipeline stopped with an error
    fn failure(&self, fingerprint: &str, query: &str, cause: &str);

    /// A found response could not be written
    fn persist_failure(&self, fingerprint: &str, query: &str, cause: &str);

    /// Diagnostic dump of a request or response
    fn dump(&self, heading: &str, fingerprint: &str, value: &Value);
}
