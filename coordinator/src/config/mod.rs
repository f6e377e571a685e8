//! Configuration management for the coordinator: loading and validating the TOML config file.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
