//! Command-line interface definitions for the coordinator.
//!
//! This module contains the CLI argument parsing structures and enums
//! used by the `powernodes` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = "powernodes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// Path to the configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, global = true, env = "POWERNODES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shut down the nodes' machines and wait until each one is off.
    Stop(PowerArgs),

    /// Start the nodes' machines and wait for the cluster to become ready.
    Start(PowerArgs),

    /// Stop, then start the nodes' machines.
    Restart(PowerArgs),

    /// Print the hypervisor state of the nodes' machines.
    Status(NodeArgs),
}

/// Node selection shared by all subcommands.
#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Names of the cluster nodes, processed in the given order.
    #[arg(required = true, num_args = 1..)]
    pub nodes: Vec<String>,
}

/// Arguments for the power subcommands.
#[derive(Debug, Args)]
pub struct PowerArgs {
    #[command(flatten)]
    pub nodes: NodeArgs,

    /// Reserved for a future ungraceful power-off. Currently has no effect.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
    Pretty,
}
