//! Cluster readiness checks run after nodes are powered back on.
//!
//! [`OcReadiness`] talks to the cluster through its CLI (`oc` by default). The
//! power operations only see the [`ClusterReadiness`] trait.

use alloc::sync::Arc;
use core::{fmt, time::Duration};
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use thiserror::Error as ThisError;
use tracing::{Instrument as _, info, info_span, warn};

use super::{
    command::{CommandError, CommandRunner, argv},
    sampler::{PollError, TimeoutSampler, retry},
};
use crate::config::ReadinessConfig;

/// Role label used to select a group of cluster nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Master,
    Worker,
}

impl NodeRole {
    /// Label selector matching nodes of this role.
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Master => "node-role.kubernetes.io/master",
            Self::Worker => "node-role.kubernetes.io/worker",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Master => "master",
            Self::Worker => "worker",
        })
    }
}

/// Node condition as shown in the STATUS column of `oc get nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Ready,
    NotReady,
}

impl NodeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::NotReady => "NotReady",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, ThisError)]
pub enum ReadinessError {
    #[error("Cluster not reachable after {tries} attempts")]
    Connectivity {
        tries: u32,
        #[source]
        source: CommandError,
    },
    #[error("{role} nodes not {status} within {timeout:?}: {pending:?}")]
    NodesNotReady {
        role: NodeRole,
        status: NodeStatus,
        timeout: Duration,
        pending: Vec<String>,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Waits for a cluster to become usable again.
pub trait ClusterReadiness: Send + Sync {
    /// Retries a trivial cluster query up to `tries` times.
    fn wait_for_cluster_connectivity(&self, tries: u32) -> BoxFuture<'_, Result<(), ReadinessError>>;

    /// Waits until every node of `role` reports `status`.
    fn wait_for_nodes_status(
        &self,
        role: NodeRole,
        status: NodeStatus,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<(), ReadinessError>>;
}

/// [`ClusterReadiness`] backed by the cluster CLI.
#[derive(Clone)]
pub struct OcReadiness {
    runner: Arc<dyn CommandRunner>,
    command: Vec<String>,
    connectivity_delay: Duration,
    poll_interval: Duration,
}

impl OcReadiness {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, config: &ReadinessConfig) -> Self {
        Self {
            runner,
            command: config.command.clone(),
            connectivity_delay: config.connectivity_delay(),
            poll_interval: config.poll_interval(),
        }
    }

    async fn oc(&self, args: &[&str]) -> Result<String, CommandError> {
        let argv = argv(&self.command, args.iter().copied());
        let output = self.runner.run(&argv).await?.ensure_success(&argv)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Names of all nodes carrying the role label.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster CLI fails.
    pub async fn node_names(&self, role: NodeRole) -> Result<Vec<String>, CommandError> {
        let stdout = self
            .oc(&["get", "nodes", "-l", role.selector(), "-o", "name"])
            .await?;
        Ok(parse_node_names(&stdout))
    }

    /// Nodes out of `names` that do not currently report `status`.
    async fn pending_nodes(
        &self,
        names: &[String],
        status: NodeStatus,
    ) -> Result<Vec<String>, CommandError> {
        let mut args = vec!["get", "nodes"];
        args.extend(names.iter().map(String::as_str));
        args.push("--no-headers");
        let stdout = self.oc(&args).await?;
        let reported = parse_node_statuses(&stdout);
        Ok(names
            .iter()
            .filter(|&name| {
                !reported
                    .iter()
                    .any(|&(ref n, ref s)| n == name && s == status.as_str())
            })
            .cloned()
            .collect())
    }

    async fn wait_for_role(
        &self,
        role: NodeRole,
        status: NodeStatus,
        timeout: Duration,
    ) -> Result<(), ReadinessError> {
        let names = self.node_names(role).await?;
        if names.is_empty() {
            warn!(%role, "No nodes found for role, nothing to wait for");
            return Ok(());
        }
        info!(%role, %status, ?names, "Waiting for nodes");

        let pending = Mutex::new(names.clone());
        let sampler = TimeoutSampler::new(timeout, self.poll_interval);
        let res = sampler
            .wait_for(|| async {
                match self.pending_nodes(&names, status).await {
                    Ok(still_pending) => {
                        let done = still_pending.is_empty();
                        if let Ok(mut guard) = pending.lock() {
                            *guard = still_pending;
                        }
                        Ok::<_, CommandError>(done)
                    }
                    // The API server usually flaps for a while after power-on.
                    Err(e) => {
                        warn!(%role, "Failed to query node status: {e}");
                        Ok(false)
                    }
                }
            })
            .await;

        match res {
            Ok(()) => {
                info!(%role, %status, "All nodes reached status");
                Ok(())
            }
            Err(PollError::Timeout { timeout }) => Err(ReadinessError::NodesNotReady {
                role,
                status,
                timeout,
                pending: pending.into_inner().unwrap_or_else(PoisonError::into_inner),
            }),
            Err(PollError::Check(e)) => Err(e.into()),
        }
    }
}

impl ClusterReadiness for OcReadiness {
    fn wait_for_cluster_connectivity(&self, tries: u32) -> BoxFuture<'_, Result<(), ReadinessError>> {
        Box::pin(
            async move {
                retry(tries.max(1), self.connectivity_delay, || async {
                    self.oc(&["get", "nodes", "-o", "name"]).await
                })
                .await
                .map_err(|source| ReadinessError::Connectivity { tries, source })?;
                info!("Cluster is reachable");
                Ok(())
            }
            .instrument(info_span!("cluster_connectivity", tries)),
        )
    }

    fn wait_for_nodes_status(
        &self,
        role: NodeRole,
        status: NodeStatus,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<(), ReadinessError>> {
        Box::pin(
            self.wait_for_role(role, status, timeout)
                .instrument(info_span!("nodes_status", %role, %status)),
        )
    }
}

/// Parses `oc get nodes -o name` output (`node/<name>` per line).
fn parse_node_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_prefix("node/").unwrap_or(line).to_string())
        .collect()
}

/// Parses `oc get nodes --no-headers` output into `(name, status)` pairs.
fn parse_node_statuses(stdout: &str) -> Vec<(String, String)> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let name = columns.next()?;
            let status = columns.next()?;
            Some((name.to_string(), status.to_string()))
        })
        .collect()
}
