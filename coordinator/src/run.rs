//! Dispatches a parsed CLI command to the power operations.

use alloc::sync::Arc;

use eyre::WrapErr as _;
use tracing::info;

use crate::{
    app::{CommandRunner, Node, PowerNodes},
    cli::{Command, NodeArgs},
    config::CoordinatorConfig,
};

/// Validates the node names given on the command line.
fn parse_nodes(args: &NodeArgs) -> eyre::Result<Vec<Node>> {
    args.nodes
        .iter()
        .map(|name| Node::new(name.as_str()).wrap_err(format!("Invalid node name {name:?}")))
        .collect()
}

/// Runs `command` against the given config and command runner.
///
/// # Errors
///
/// Returns an error if a node name is invalid or the power operation fails.
pub async fn execute(
    command: Command,
    config: &CoordinatorConfig,
    runner: Arc<dyn CommandRunner>,
) -> eyre::Result<()> {
    let power = PowerNodes::from_config(runner, config);

    match command {
        Command::Stop(args) => {
            let nodes = parse_nodes(&args.nodes)?;
            power.stop_machines(&nodes, args.force).await?;
            info!("Stopped {} node(s)", nodes.len());
        }
        Command::Start(args) => {
            let nodes = parse_nodes(&args.nodes)?;
            power.start_machines(&nodes, args.force).await?;
            info!("Started {} node(s), cluster is ready", nodes.len());
        }
        Command::Restart(args) => {
            let nodes = parse_nodes(&args.nodes)?;
            power.restart_machines(&nodes, args.force).await?;
            info!("Restarted {} node(s), cluster is ready", nodes.len());
        }
        Command::Status(args) => {
            for node in parse_nodes(&args)? {
                let state = power
                    .machine_state(&node)
                    .await
                    .wrap_err(format!("Failed to query state of node {node}"))?;
                let domain = power.hypervisor().domain_name(&node);
                println!("{node}\t{domain}\t{state}");
            }
        }
    }
    Ok(())
}
