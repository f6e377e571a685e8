//! Configuration data types and structures for the coordinator.
//!
//! Every field has a default, so an empty (or absent) config file yields the
//! values the tool was originally written against.

use core::time::Duration;

use serde::Deserialize;

/// Top-level configuration file.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    pub hypervisor: HypervisorConfig,
    pub power: PowerConfig,
    pub readiness: ReadinessConfig,
}

/// How to reach the hypervisor and how nodes map to its domains.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HypervisorConfig {
    /// Command prefix, the verb and domain name are appended.
    pub command: Vec<String>,
    /// Domain name template, `{name}` is replaced with the node name.
    pub domain_template: String,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            command: vec!["sudo".to_string(), "virsh".to_string()],
            domain_template: "test-ocp4-6-{name}".to_string(),
        }
    }
}

/// Timing of the power-off wait.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PowerConfig {
    pub stop_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: 900,
            poll_interval_secs: 3,
        }
    }
}

impl PowerConfig {
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Cluster CLI and the limits used while waiting for the cluster after power-on.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessConfig {
    pub command: Vec<String>,
    pub connectivity_tries: u32,
    pub connectivity_delay_secs: u64,
    pub master_timeout_secs: u64,
    pub worker_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            command: vec!["oc".to_string()],
            connectivity_tries: 900,
            connectivity_delay_secs: 3,
            master_timeout_secs: 900,
            worker_timeout_secs: 900,
            poll_interval_secs: 3,
        }
    }
}

impl ReadinessConfig {
    #[must_use]
    pub const fn connectivity_delay(&self) -> Duration {
        Duration::from_secs(self.connectivity_delay_secs)
    }

    #[must_use]
    pub const fn master_timeout(&self) -> Duration {
        Duration::from_secs(self.master_timeout_secs)
    }

    #[must_use]
    pub const fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
