//! Runner service implementations

pub mod file_store;
pub mod http_transport;
pub mod loader;
pub mod reporter;

#[cfg(test)]
pub mod tests;

pub use file_store::*;
pub use http_transport::*;
pub use loader::*;
pub use reporter::*;
