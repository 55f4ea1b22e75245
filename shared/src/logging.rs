//! Shared logging utilities for consistent tracing across the runner
//!
//! Diagnostics are written to stderr. Stdout is reserved for the progress
//! stream, one line per query.

use chrono::{DateTime, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::errors::{SharedError, SharedResult};

/// Levels accepted by `--log-level`
const KNOWN_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Build the default filter directive for a base level
pub fn default_filter(base_level: &str) -> String {
    format!("runner={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Resolve the filter to install: `RUST_LOG` wins over the computed default
fn resolve_filter(log_level: Option<&str>) -> SharedResult<EnvFilter> {
    let base_level = log_level.unwrap_or("info").to_lowercase();
    if !KNOWN_LEVELS.contains(&base_level.as_str()) {
        return Err(SharedError::InvalidConfig {
            field: "log_level".to_string(),
            value: base_level,
        });
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(default_filter(&base_level)).map_err(|e| SharedError::LoggingError {
        message: e.to_string(),
    })
}

/// Initialize tracing subscriber with the given base level
pub fn init_tracing_with_level(log_level: Option<&str>) -> SharedResult<()> {
    use tracing_subscriber::fmt;

    let env_filter = resolve_filter(log_level)?;

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| SharedError::LoggingError {
            message: e.to_string(),
        })
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for correlated info logging
#[macro_export]
macro_rules! run_info {
    ($correlation:expr, $($arg:tt)*) => {
        tracing::info!(
            correlation = %$correlation,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for correlated warning logging
#[macro_export]
macro_rules! run_warn {
    ($correlation:expr, $($arg:tt)*) => {
        tracing::warn!(
            correlation = %$correlation,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for correlated error logging
#[macro_export]
macro_rules! run_error {
    ($correlation:expr, $($arg:tt)*) => {
        tracing::error!(
            correlation = %$correlation,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for correlated debug logging
#[macro_export]
macro_rules! run_debug {
    ($correlation:expr, $($arg:tt)*) => {
        tracing::debug!(
            correlation = %$correlation,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(
        correlation = "run",
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for the end-of-run summary
pub fn log_summary(summary: &dyn std::fmt::Display) {
    info!(
        correlation = "run",
        timestamp = format_timestamp(),
        "✅ {}",
        summary
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_mentions_crates() {
        let filter = default_filter("debug");

        assert!(filter.contains("runner=debug"));
        assert!(filter.contains("shared=debug"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn test_unknown_level_rejected() {
        let result = resolve_filter(Some("loud"));

        match result {
            Err(SharedError::InvalidConfig { field, value }) => {
                assert_eq!(field, "log_level");
                assert_eq!(value, "loud");
            }
            other => panic!("Expected InvalidConfig, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_timestamp_format() {
        let ts = format_timestamp();
        // HH:MM:SS.mmm
        assert_eq!(ts.len(), 12);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[8..9], ".");
    }
}
