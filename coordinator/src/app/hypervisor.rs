//! Hypervisor (`virsh`) wrapper: domain naming, state queries and power commands.

use alloc::sync::Arc;
use core::fmt;

use thiserror::Error as ThisError;
use tracing::info;

use super::command::{CommandError, CommandOutput, CommandRunner, argv};
use crate::config::HypervisorConfig;

/// Placeholder in the domain template that is replaced by the node name.
pub const NODE_NAME_PLACEHOLDER: &str = "{name}";

#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("Node name must not be empty")]
pub struct InvalidNodeName;

/// A cluster node, backed 1:1 by a hypervisor domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    name: String,
}

impl Node {
    /// # Errors
    ///
    /// Returns [`InvalidNodeName`] if `name` is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNodeName> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InvalidNodeName);
        }
        Ok(Self { name })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Run state of a domain as printed by `virsh domstate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainState {
    Running,
    Idle,
    Paused,
    InShutdown,
    ShutOff,
    Crashed,
    PmSuspended,
    /// Anything else, including empty output from a failed query.
    Other(String),
}

impl DomainState {
    /// Parses raw `domstate` stdout. Matching is case-insensitive and ignores trailing whitespace.
    #[must_use]
    pub fn parse(stdout: &[u8]) -> Self {
        let text = String::from_utf8_lossy(stdout).trim_end().to_lowercase();
        match text.as_str() {
            "running" => Self::Running,
            "idle" => Self::Idle,
            "paused" => Self::Paused,
            "in shutdown" => Self::InShutdown,
            "shut off" => Self::ShutOff,
            "crashed" => Self::Crashed,
            "pmsuspended" => Self::PmSuspended,
            _ => Self::Other(text),
        }
    }

    /// Every state except [`DomainState::Running`] counts as down.
    #[must_use]
    pub const fn is_down(&self) -> bool {
        !matches!(*self, Self::Running)
    }
}

impl fmt::Display for DomainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Running => f.write_str("running"),
            Self::Idle => f.write_str("idle"),
            Self::Paused => f.write_str("paused"),
            Self::InShutdown => f.write_str("in shutdown"),
            Self::ShutOff => f.write_str("shut off"),
            Self::Crashed => f.write_str("crashed"),
            Self::PmSuspended => f.write_str("pmsuspended"),
            Self::Other(ref text) if text.is_empty() => f.write_str("unknown"),
            Self::Other(ref text) => f.write_str(text),
        }
    }
}

/// Issues `virsh` commands for nodes through a [`CommandRunner`].
#[derive(Clone)]
pub struct Hypervisor {
    runner: Arc<dyn CommandRunner>,
    command: Vec<String>,
    domain_template: String,
}

impl Hypervisor {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, config: &HypervisorConfig) -> Self {
        Self {
            runner,
            command: config.command.clone(),
            domain_template: config.domain_template.clone(),
        }
    }

    /// Name of the hypervisor domain backing `node`.
    #[must_use]
    pub fn domain_name(&self, node: &Node) -> String {
        self.domain_template.replace(NODE_NAME_PLACEHOLDER, node.name())
    }

    /// Runs `domstate` without checking the exit status; a failed query simply yields non-`running` output.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command could not be spawned.
    pub async fn domstate(&self, node: &Node) -> Result<DomainState, CommandError> {
        let output = self.invoke("domstate", node).await?;
        Ok(DomainState::parse(&output.stdout))
    }

    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    pub async fn shutdown(&self, node: &Node) -> Result<CommandOutput, CommandError> {
        self.invoke_checked("shutdown", node).await
    }

    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    pub async fn start(&self, node: &Node) -> Result<CommandOutput, CommandError> {
        self.invoke_checked("start", node).await
    }

    async fn invoke(&self, verb: &str, node: &Node) -> Result<CommandOutput, CommandError> {
        let domain = self.domain_name(node);
        let argv = argv(&self.command, [verb, domain.as_str()]);
        self.runner.run(&argv).await
    }

    async fn invoke_checked(&self, verb: &str, node: &Node) -> Result<CommandOutput, CommandError> {
        let domain = self.domain_name(node);
        let argv = argv(&self.command, [verb, domain.as_str()]);
        let output = self.runner.run(&argv).await?.ensure_success(&argv)?;
        info!(
            %node,
            %domain,
            stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
            "Result of {verb}"
        );
        Ok(output)
    }
}
