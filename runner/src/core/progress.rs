//! Progress stream line formats

use crate::types::Outcome;

/// `OK, <fingerprint>: <query>` or `--, <fingerprint>: <query>`
pub fn progress_line(outcome: Outcome, fingerprint: &str, query: &str) -> String {
    format!("{}, {}: {}", outcome.status(), fingerprint, query)
}

/// Line for a query whose pipeline failed
pub fn failure_line(fingerprint: &str, query: &str, cause: &str) -> String {
    format!("ERROR; failed to process request: {fingerprint}: {query} => {cause}")
}

/// Line for a found response that could not be written
pub fn persist_failure_line(fingerprint: &str, query: &str, cause: &str) -> String {
    format!("WARN; failed to write response: {fingerprint}: {query} => {cause}")
}
