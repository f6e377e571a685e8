mod command;
mod hypervisor;
mod power_control;
mod readiness;
mod sampler;

// Re-export a curated surface for the CLI and for library consumers
pub use command::{CommandError, CommandOutput, CommandRunner, SystemRunner};
pub use hypervisor::{DomainState, Hypervisor, InvalidNodeName, NODE_NAME_PLACEHOLDER, Node};
pub use power_control::{PowerNodes, PowerNodesError, Timings};
pub use readiness::{ClusterReadiness, NodeRole, NodeStatus, OcReadiness, ReadinessError};
pub use sampler::{PollError, TimeoutSampler, retry};
