//! Configuration loading utilities for the coordinator.
//!
//! This module provides functions for reading, parsing and validating
//! configuration files from disk.

use std::path::Path;

use eyre::{WrapErr as _, ensure};
use tokio::fs;

use crate::{app::NODE_NAME_PLACEHOLDER, config::CoordinatorConfig};

/// Reads and parses the coordinator config from a TOML file.
///
/// # Arguments
///
/// * `path` - File path to the TOML configuration file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read, parsed or fails validation.
pub async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<CoordinatorConfig> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref).await.wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let config: CoordinatorConfig = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;
    validate(&config).wrap_err(format!("Invalid config at: {}", path_ref.display()))?;
    Ok(config)
}

/// Loads `path` if given, otherwise falls back to the built-in defaults.
///
/// # Errors
///
/// See [`load`].
pub async fn load_or_default(path: Option<&Path>) -> eyre::Result<CoordinatorConfig> {
    match path {
        Some(path) => load(path).await,
        None => Ok(CoordinatorConfig::default()),
    }
}

/// Checks the invariants serde cannot express.
///
/// # Errors
///
/// Returns an error describing the first violated constraint.
pub fn validate(config: &CoordinatorConfig) -> eyre::Result<()> {
    ensure!(
        !config.hypervisor.command.is_empty(),
        "hypervisor.command must not be empty"
    );
    ensure!(
        config
            .hypervisor
            .domain_template
            .contains(NODE_NAME_PLACEHOLDER),
        "hypervisor.domain_template must contain {NODE_NAME_PLACEHOLDER}"
    );
    ensure!(
        !config.readiness.command.is_empty(),
        "readiness.command must not be empty"
    );
    ensure!(
        config.readiness.connectivity_tries >= 1,
        "readiness.connectivity_tries must be at least 1"
    );
    Ok(())
}
