//! Library entry for the `powernodes` coordinator.
//!
//! Exposes `inner_main` so the workspace-level shim binary can call into the coordinator logic,
//! and the power operations for use from other automation.
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "This is not problematic in tests",)
)]

extern crate alloc;
extern crate core;

pub mod app;
pub mod cli;
pub mod config;
pub mod run;

use alloc::sync::Arc;
use std::sync::Once;

use eyre::Result;
use tracing::Instrument as _;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use app::SystemRunner;
use cli::{Cli, LogFormat};

static INIT_TRACING: Once = Once::new();

/// Installs the global tracing subscriber once. Respects `RUST_LOG`, defaults to `info`.
fn init_tracing(format: LogFormat) {
    INIT_TRACING.call_once(move || {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_timer(ChronoLocal::rfc_3339())
            .with_writer(std::io::stderr);

        match format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// The coordinator's main function; can be called from a shim binary.
///
/// Loads the configuration and dispatches the requested power operation.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the operation fails.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    init_tracing(invocation.log_format);

    let config = config::load_or_default(invocation.config.as_deref()).await?;

    let span = tracing::info_span!(
        "powernodes",
        config = ?invocation.config,
        pid = ?std::process::id(),
        version = env!("CARGO_PKG_VERSION")
    );

    run::execute(invocation.command, &config, Arc::new(SystemRunner))
        .instrument(span)
        .await
}
