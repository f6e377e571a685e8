//! Power control of hypervisor-backed cluster nodes.
//!
//! This module contains the stop, start and restart operations. Nodes are
//! always handled one after another; the first failure ends the batch.

use alloc::sync::Arc;
use core::time::Duration;

use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

use super::{
    command::{CommandError, CommandRunner},
    hypervisor::{DomainState, Hypervisor, Node},
    readiness::{ClusterReadiness, NodeRole, NodeStatus, OcReadiness, ReadinessError},
    sampler::{PollError, TimeoutSampler},
};
use crate::config::CoordinatorConfig;

/// Errors returned by the power operations.
#[derive(Debug, ThisError)]
pub enum PowerNodesError {
    /// The node did not power down within the allotted window.
    #[error("Unexpected behaviour: node {node} is still running")]
    UnexpectedBehaviour { node: String },
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Readiness(#[from] ReadinessError),
}

/// Timeouts and limits used by [`PowerNodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub stop: TimeoutSampler,
    pub connectivity_tries: u32,
    pub master_timeout: Duration,
    pub worker_timeout: Duration,
}

impl Timings {
    #[must_use]
    pub const fn from_config(config: &CoordinatorConfig) -> Self {
        Self {
            stop: TimeoutSampler::new(config.power.stop_timeout(), config.power.poll_interval()),
            connectivity_tries: config.readiness.connectivity_tries,
            master_timeout: config.readiness.master_timeout(),
            worker_timeout: config.readiness.worker_timeout(),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::from_config(&CoordinatorConfig::default())
    }
}

/// Stops, starts and restarts nodes. Holds no state besides its collaborators.
#[derive(Clone)]
pub struct PowerNodes {
    hypervisor: Hypervisor,
    readiness: Arc<dyn ClusterReadiness>,
    timings: Timings,
}

impl PowerNodes {
    #[must_use]
    pub fn new(
        hypervisor: Hypervisor,
        readiness: Arc<dyn ClusterReadiness>,
        timings: Timings,
    ) -> Self {
        Self {
            hypervisor,
            readiness,
            timings,
        }
    }

    /// Wires the `virsh`/`oc` implementations from a config.
    #[must_use]
    pub fn from_config(runner: Arc<dyn CommandRunner>, config: &CoordinatorConfig) -> Self {
        Self::new(
            Hypervisor::new(Arc::clone(&runner), &config.hypervisor),
            Arc::new(OcReadiness::new(runner, &config.readiness)),
            Timings::from_config(config),
        )
    }

    #[must_use]
    pub const fn hypervisor(&self) -> &Hypervisor {
        &self.hypervisor
    }

    /// Current hypervisor state of `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hypervisor command cannot be spawned.
    pub async fn machine_state(&self, node: &Node) -> Result<DomainState, CommandError> {
        self.hypervisor.domstate(node).await
    }

    /// Whether `node` is powered off. Anything but `running` counts as down.
    ///
    /// # Errors
    ///
    /// Returns an error if the hypervisor command cannot be spawned.
    pub async fn verify_machine_is_down(&self, node: &Node) -> Result<bool, CommandError> {
        let state = self.machine_state(node).await?;
        debug!(%node, %state, "Machine state");
        Ok(state.is_down())
    }

    /// Shuts down each node and waits until it is down before moving to the next.
    ///
    /// `force` is reserved for a future ungraceful power-off and is currently ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PowerNodesError::UnexpectedBehaviour`] for the first node still
    /// running after the stop timeout, or the underlying command error.
    #[tracing::instrument(skip_all, fields(nodes = nodes.len()), err(Display))]
    pub async fn stop_machines(&self, nodes: &[Node], force: bool) -> Result<(), PowerNodesError> {
        debug!(force, "Ignoring force flag");
        for node in nodes {
            self.hypervisor.shutdown(node).await?;
            info!(%node, "Verifying node is down");

            let res = self
                .timings
                .stop
                .wait_for(|| self.verify_machine_is_down(node))
                .await;
            match res {
                Ok(()) => info!(%node, "Node is down"),
                Err(PollError::Timeout { timeout }) => {
                    warn!(%node, ?timeout, "Node did not power down");
                    return Err(PowerNodesError::UnexpectedBehaviour {
                        node: node.name().to_string(),
                    });
                }
                Err(PollError::Check(e)) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Starts all nodes, then waits for cluster connectivity, masters and workers, in that order.
    ///
    /// `force` is accepted for symmetry with [`Self::stop_machines`] and is ignored.
    ///
    /// # Errors
    ///
    /// Returns the first command or readiness error encountered.
    #[tracing::instrument(skip_all, fields(nodes = nodes.len()), err(Display))]
    pub async fn start_machines(&self, nodes: &[Node], force: bool) -> Result<(), PowerNodesError> {
        debug!(force, "Ignoring force flag");
        for node in nodes {
            self.hypervisor.start(node).await?;
        }

        self.readiness
            .wait_for_cluster_connectivity(self.timings.connectivity_tries)
            .await?;
        self.readiness
            .wait_for_nodes_status(
                NodeRole::Master,
                NodeStatus::Ready,
                self.timings.master_timeout,
            )
            .await?;
        self.readiness
            .wait_for_nodes_status(
                NodeRole::Worker,
                NodeStatus::Ready,
                self.timings.worker_timeout,
            )
            .await?;
        Ok(())
    }

    /// [`Self::stop_machines`] followed by [`Self::start_machines`] on the same nodes.
    ///
    /// # Errors
    ///
    /// Returns the first error of either phase; a failed stop skips the start.
    #[tracing::instrument(skip_all, fields(nodes = nodes.len()))]
    pub async fn restart_machines(&self, nodes: &[Node], force: bool) -> Result<(), PowerNodesError> {
        self.stop_machines(nodes, force).await?;
        self.start_machines(nodes, force).await
    }
}
