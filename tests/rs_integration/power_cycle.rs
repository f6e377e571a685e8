//! Integration tests running stop, start and restart against stub hypervisor and cluster commands.

use crate::common::{Hypervisor, Sandbox};

#[test]
fn stop_powers_off_running_domain() {
    let sandbox = Sandbox::new("stop_ok", Hypervisor::Stateful);
    sandbox.set_domain_state("test-ocp4-6-worker-0", "running");

    let out = sandbox.run(&["stop", "worker-0"]);
    assert!(
        out.status.success(),
        "stop failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(sandbox.domain_state("test-ocp4-6-worker-0"), "shut off");
    assert_eq!(
        sandbox.virsh_log(),
        [
            "shutdown test-ocp4-6-worker-0",
            "domstate test-ocp4-6-worker-0"
        ]
    );
}

#[test]
fn stop_fails_when_domain_keeps_running() {
    let sandbox = Sandbox::new("stop_stuck", Hypervisor::Stuck);

    let out = sandbox.run(&["stop", "--force", "stuck", "never-touched"]);
    assert!(!out.status.success(), "stop must fail for a running domain");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("node stuck is still running"),
        "error should name the node: {stderr}"
    );
    assert!(
        !sandbox
            .virsh_log()
            .iter()
            .any(|line| line.contains("never-touched")),
        "later nodes must not be touched"
    );
}

#[test]
fn start_waits_for_masters_then_workers() {
    let sandbox = Sandbox::new("start", Hypervisor::Stateful);

    let out = sandbox.run(&["start", "master-0", "worker-0"]);
    assert!(
        out.status.success(),
        "start failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(sandbox.domain_state("test-ocp4-6-master-0"), "running");
    assert_eq!(sandbox.domain_state("test-ocp4-6-worker-0"), "running");

    let oc = sandbox.oc_log();
    assert_eq!(oc[0], "get nodes -o name", "connectivity is checked first");
    let master = oc
        .iter()
        .position(|l| l.contains("node-role.kubernetes.io/master"))
        .expect("masters were listed");
    let worker = oc
        .iter()
        .position(|l| l.contains("node-role.kubernetes.io/worker"))
        .expect("workers were listed");
    assert!(master < worker, "masters are checked before workers: {oc:?}");
}

#[test]
fn restart_stops_before_starting() {
    let sandbox = Sandbox::new("restart", Hypervisor::Stateful);
    sandbox.set_domain_state("test-ocp4-6-a", "running");

    let out = sandbox.run(&["restart", "a"]);
    assert!(
        out.status.success(),
        "restart failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(
        sandbox.virsh_log(),
        [
            "shutdown test-ocp4-6-a",
            "domstate test-ocp4-6-a",
            "start test-ocp4-6-a"
        ]
    );
    assert_eq!(sandbox.domain_state("test-ocp4-6-a"), "running");
}

#[test]
fn blank_node_name_is_rejected() {
    let sandbox = Sandbox::new("blank_node", Hypervisor::Stateful);

    let out = sandbox.run(&["stop", " "]);
    assert!(!out.status.success(), "blank node names are invalid");
    assert!(sandbox.virsh_log().is_empty(), "no hypervisor calls");
}
