//! Shim binary that calls into the `powernodes_coordinator` library's `inner_main`.
use clap::Parser as _;
use eyre::Result;

use powernodes_coordinator::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Delegate to library entrypoint
    powernodes_coordinator::inner_main(Cli::parse()).await
}
