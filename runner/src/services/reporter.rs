//! Console progress reporter

use std::io::Write;

use serde_json::Value;

use crate::core::progress;
use crate::traits::ProgressReporter;
use crate::types::Outcome;

/// Progress and failure lines on stdout; warnings and dumps on stderr.
///
/// Each line is written under the stream lock so lines from concurrent
/// pipelines never interleave.
#[derive(Debug, Default, Clone)]
pub struct StdoutReporter;

impl StdoutReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for StdoutReporter {
    fn progress(&self, outcome: Outcome, fingerprint: &str, query: &str) {
        let line = progress::progress_line(outcome, fingerprint, query);
        let _ = writeln!(std::io::stdout().lock(), "{}", line);
    }

    fn failure(&self, fingerprint: &str, query: &str, cause: &str) {
        let line = progress::failure_line(fingerprint, query, cause);
        let _ = writeln!(std::io::stdout().lock(), "{}", line);
    }

    fn persist_failure(&self, fingerprint: &str, query: &str, cause: &str) {
        let line = progress::persist_failure_line(fingerprint, query, cause);
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn dump(&self, heading: &str, fingerprint: &str, value: &Value) {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        let _ = writeln!(std::io::stderr().lock(), "{} {}:\n{}", heading, fingerprint, text);
    }
}
