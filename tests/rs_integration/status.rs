//! Integration tests for the `status` subcommand.

use crate::common::{Hypervisor, Sandbox};

#[test]
fn status_prints_domain_states() {
    let sandbox = Sandbox::new("status", Hypervisor::Stateful);
    sandbox.set_domain_state("test-ocp4-6-master-0", "running");
    sandbox.set_domain_state("test-ocp4-6-worker-0", "paused");

    let out = sandbox.run(&["status", "master-0", "worker-0", "worker-1"]);
    assert!(
        out.status.success(),
        "status failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(
        lines,
        [
            "master-0\ttest-ocp4-6-master-0\trunning",
            "worker-0\ttest-ocp4-6-worker-0\tpaused",
            "worker-1\ttest-ocp4-6-worker-1\tshut off",
        ]
    );
}

#[test]
fn missing_config_file_is_an_error() {
    let out = std::process::Command::new(crate::common::powernodes_bin_path())
        .args(["--config", "/nonexistent/powernodes.toml", "status", "a"])
        .output()
        .expect("failed to run powernodes");
    assert!(!out.status.success(), "missing config must fail");
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("Failed to read config file"),
        "error mentions the config file"
    );
}
