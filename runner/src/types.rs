//! Runner data types

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::core::path::PathExpr;
use crate::error::{RunnerError, RunnerResult};

/// Expansion used when a template does not list any
pub const DEFAULT_EXPANSION_PATH: &str = "$.body.query";

/// Stands in for a fingerprint that could not be computed
pub const FINGERPRINT_PLACEHOLDER: &str = "-";

/// Extension of persisted artifact files
pub const ARTIFACT_EXTENSION: &str = "json";

/// A request definition shared by every query of a run.
///
/// `document` is the template entry as loaded, with its `url` replaced by
/// the resolved absolute URL. It is never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    pub url: String,
    pub document: Value,
    pub expansion_paths: Vec<PathExpr>,
}

impl RequestTemplate {
    /// The template's request body
    pub fn body(&self) -> &Value {
        self.document.get("body").unwrap_or(&Value::Null)
    }
}

/// One query's private copy of the template after substitution
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRequest {
    pub url: String,
    pub document: Value,
}

impl ExpandedRequest {
    /// Body sent over the transport
    pub fn body(&self) -> &Value {
        self.document.get("body").unwrap_or(&Value::Null)
    }
}

impl Serialize for ExpandedRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

/// Classification of a processed query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Found,
    NotFound,
    Error,
}

impl Outcome {
    /// Status column of the progress stream
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Found => "OK",
            Outcome::NotFound => "--",
            Outcome::Error => "ERROR",
        }
    }
}

/// The few response fields kept from a raw response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredResponse {
    #[serde(rename = "numFound")]
    pub count: u64,
    pub highlights: Value,
    pub hitregions: Value,
}

/// Result of filtering one transport result
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseRecord {
    Filtered(FilteredResponse),
    Failed { cause: String },
}

impl ResponseRecord {
    pub fn outcome(&self) -> Outcome {
        match self {
            ResponseRecord::Filtered(filtered) if filtered.count > 0 => Outcome::Found,
            ResponseRecord::Filtered(_) => Outcome::NotFound,
            ResponseRecord::Failed { .. } => Outcome::Error,
        }
    }

    pub fn filtered(&self) -> Option<&FilteredResponse> {
        match self {
            ResponseRecord::Filtered(filtered) => Some(filtered),
            ResponseRecord::Failed { .. } => None,
        }
    }
}

/// On-disk form of a found response
#[derive(Debug, Serialize)]
pub struct PersistedArtifact<'a> {
    pub request: &'a ExpandedRequest,
    #[serde(rename = "response-filtered")]
    pub response_filtered: &'a FilteredResponse,
}

/// Where the response filter looks for its fields
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFields {
    pub count: PathExpr,
    pub highlights: PathExpr,
    pub hitregions: PathExpr,
}

impl ResponseFields {
    pub fn parse(count: &str, highlights: &str, hitregions: &str) -> RunnerResult<Self> {
        Ok(Self {
            count: PathExpr::parse(count)?,
            highlights: PathExpr::parse(highlights)?,
            hitregions: PathExpr::parse(hitregions)?,
        })
    }
}

impl Default for ResponseFields {
    fn default() -> Self {
        Self {
            count: PathExpr::field_chain(&["response", "numFound"]),
            highlights: PathExpr::field_chain(&["highlighting"]),
            hitregions: PathExpr::field_chain(&["hitregions"]),
        }
    }
}

/// Whether pipelines talk to the transport at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    DryRun,
}

/// Immutable configuration of a single run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub template: RequestTemplate,
    pub queries: Vec<String>,
    pub parallelism: usize,
    pub output_dir: Option<PathBuf>,
    pub mode: RunMode,
    pub dump_request: Option<String>,
    pub dump_response: Option<String>,
    pub response_fields: ResponseFields,
}

impl RunConfig {
    /// Sequential, live, non-persisting run over `queries`
    pub fn new(template: RequestTemplate, queries: Vec<String>) -> Self {
        Self {
            template,
            queries,
            parallelism: 1,
            output_dir: None,
            mode: RunMode::Live,
            dump_request: None,
            dump_response: None,
            response_fields: ResponseFields::default(),
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Dumping a request never sends anything
    pub fn with_dump_request(mut self, fingerprint: Option<String>) -> Self {
        if fingerprint.is_some() {
            self.mode = RunMode::DryRun;
        }
        self.dump_request = fingerprint;
        self
    }

    pub fn with_dump_response(mut self, fingerprint: Option<String>) -> Self {
        self.dump_response = fingerprint;
        self
    }

    pub fn with_response_fields(mut self, response_fields: ResponseFields) -> Self {
        self.response_fields = response_fields;
        self
    }

    /// Reject configurations that must not reach dispatch
    pub fn validate(&self) -> RunnerResult<()> {
        if self.parallelism < 1 {
            return Err(RunnerError::InvalidParallelism {
                value: self.parallelism,
            });
        }
        if let Some(dir) = &self.output_dir {
            if !dir.is_dir() {
                return Err(RunnerError::ConfigError {
                    message: format!("output path is not a directory: {}", dir.display()),
                });
            }
        }
        Ok(())
    }
}

/// How a single pipeline ended
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed { outcome: Outcome, persisted: Persisted },
    DryRun,
    Skipped,
    Failed { cause: String },
}

/// What the persister did with a completed response
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted {
    Written(PathBuf),
    NotRequired,
    Failed { cause: String },
}

/// Everything reported back from one query's pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub query: String,
    pub fingerprint: Option<String>,
    pub outcome: PipelineOutcome,
    /// Time spent in the transport call, if one was made
    pub latency: Option<Duration>,
}

impl PipelineReport {
    pub fn new(query: String, fingerprint: Option<String>, outcome: PipelineOutcome) -> Self {
        Self {
            query,
            fingerprint,
            outcome,
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

/// Totals of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub errors: usize,
    pub dry_run: usize,
    pub skipped: usize,
    pub artifacts_written: usize,
    pub persist_failures: usize,
    /// Requests that reached the transport
    pub sent: usize,
    /// Sum of transport latencies over `sent`
    pub request_time: Duration,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total,
            found: 0,
            not_found: 0,
            errors: 0,
            dry_run: 0,
            skipped: 0,
            artifacts_written: 0,
            persist_failures: 0,
            sent: 0,
            request_time: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of pipelines that have finished, in any way
    pub fn finished(&self) -> usize {
        self.found + self.not_found + self.errors + self.dry_run + self.skipped
    }

    /// Mean transport latency, zero when nothing was sent
    pub fn average_latency(&self) -> Duration {
        match u32::try_from(self.sent) {
            Ok(sent) if sent > 0 => self.request_time / sent,
            _ => Duration::ZERO,
        }
    }

    /// Fold one pipeline's report into the totals
    pub fn record(&mut self, report: &PipelineReport) {
        if let Some(latency) = report.latency {
            self.sent += 1;
            self.request_time += latency;
        }

        match &report.outcome {
            PipelineOutcome::Completed { outcome, persisted } => {
                match outcome {
                    Outcome::Found => self.found += 1,
                    Outcome::NotFound => self.not_found += 1,
                    Outcome::Error => self.errors += 1,
                }
                match persisted {
                    Persisted::Written(_) => self.artifacts_written += 1,
                    Persisted::Failed { .. } => self.persist_failures += 1,
                    Persisted::NotRequired => {}
                }
            }
            PipelineOutcome::DryRun => self.dry_run += 1,
            PipelineOutcome::Skipped => self.skipped += 1,
            PipelineOutcome::Failed { .. } => self.errors += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done in {} msec, requests: {}, avg: {} msec., found: {}, not found: {}, errors: {}, artifacts: {}",
            self.elapsed.as_millis(),
            self.total,
            self.average_latency().as_millis(),
            self.found,
            self.not_found,
            self.errors,
            self.artifacts_written
        )?;
        if self.persist_failures > 0 {
            write!(f, ", write failures: {}", self.persist_failures)?;
        }
        if self.dry_run > 0 {
            write!(f, ", dry run: {}", self.dry_run)?;
        }
        if self.skipped > 0 {
            write!(f, ", skipped: {}", self.skipped)?;
        }
        Ok(())
    }
}
