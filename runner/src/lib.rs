//! Template-driven request runner
//!
//! Expands one request template against a list of queries, dispatches the
//! expanded requests with a bounded number in flight, and filters and
//! persists the responses under a content fingerprint of each request.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use crate::core::Dispatcher;
pub use error::{RunnerError, RunnerResult, TransportError};
pub use traits::*;
pub use types::*;
