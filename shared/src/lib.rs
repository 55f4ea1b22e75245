//! Shared building blocks for the request runner
//!
//! Contains the pieces that are not specific to the dispatch pipeline:
//! tracing initialization, structured logging macros and the shared error type.

pub mod errors;
pub mod logging;

pub use errors::*;
