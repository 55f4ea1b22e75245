//! Tests for runner services
//!
//! The HTTP transport runs against a local mock server and the artifact
//! store against a temporary directory.
