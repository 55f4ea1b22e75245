//! Runner core: per-query pipeline stages and the dispatcher that drives them

pub mod dispatcher;
pub mod expander;
pub mod filter;
pub mod fingerprint;
pub mod path;
pub mod persister;
pub mod progress;
pub mod template;

pub use dispatcher::Dispatcher;
pub use expander::expand;
pub use filter::filter;
pub use fingerprint::fingerprint;
pub use path::PathExpr;
pub use template::compile;
