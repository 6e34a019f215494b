pub mod abi;
pub mod config;
pub mod logging;
pub mod runtime;

pub use runtime::value::Value;

/// Runtime version reported in fatal diagnostics.
pub const VERSION: &str = "0.1";
