//! Common utilities for integration tests.
//!
//! Each test gets its own sandbox directory holding stub `virsh`/`oc` scripts,
//! their state files and the config pointing at them. The `powernodes` binary
//! is then run against that config.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

pub(crate) const fn powernodes_bin_path() -> &'static str {
    env!("CARGO_BIN_EXE_powernodes")
}

/// Hypervisor stub that keeps one state file per domain and logs every call.
const VIRSH_STUB: &str = r#"#!/bin/sh
dir="@DIR@"
echo "$1 $2" >> "$dir/virsh.log"
case "$1" in
  domstate) cat "$dir/$2.state" 2>/dev/null || echo "shut off" ;;
  shutdown) echo "shut off" > "$dir/$2.state"; echo "Domain '$2' is being shutdown" ;;
  start) echo "running" > "$dir/$2.state"; echo "Domain '$2' started" ;;
  *) echo "error: unknown command '$1'" >&2; exit 1 ;;
esac
"#;

/// Hypervisor stub whose domains ignore shutdown requests.
const STUCK_VIRSH_STUB: &str = r#"#!/bin/sh
echo "$1 $2" >> "@DIR@/virsh.log"
case "$1" in
  domstate) echo "running" ;;
  *) echo "Domain '$2' is being shutdown" ;;
esac
"#;

/// Cluster CLI stub with one ready master and one ready worker.
const OC_STUB: &str = r#"#!/bin/sh
echo "$*" >> "@DIR@/oc.log"
case "$*" in
  *"-l node-role.kubernetes.io/master"*) echo "node/master-0" ;;
  *"-l node-role.kubernetes.io/worker"*) echo "node/worker-0" ;;
  *"--no-headers"*) printf 'master-0   Ready   master   3d   v1.19.0\nworker-0   Ready   worker   3d   v1.19.0\n' ;;
  *) printf 'node/master-0\nnode/worker-0\n' ;;
esac
"#;

/// Which hypervisor stub a sandbox uses.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Hypervisor {
    Stateful,
    Stuck,
}

/// Temporary directory with stubs and config, removed on drop.
pub(crate) struct Sandbox {
    dir: PathBuf,
}

impl Sandbox {
    pub(crate) fn new(name: &str, hypervisor: Hypervisor) -> Self {
        let dir = env::temp_dir().join(format!("powernodes_it_{name}_{}", std::process::id()));
        drop(fs::remove_dir_all(&dir));
        fs::create_dir_all(&dir).expect("failed to create sandbox");
        let sandbox = Self { dir };

        let virsh = match hypervisor {
            Hypervisor::Stateful => VIRSH_STUB,
            Hypervisor::Stuck => STUCK_VIRSH_STUB,
        };
        let virsh_path = sandbox.write_stub("virsh-stub.sh", virsh);
        let oc_path = sandbox.write_stub("oc-stub.sh", OC_STUB);

        let config = format!(
            r#"
            [hypervisor]
            command = ["sh", "{virsh}"]

            [power]
            stop_timeout_secs = 0
            poll_interval_secs = 0

            [readiness]
            command = ["sh", "{oc}"]
            connectivity_tries = 3
            connectivity_delay_secs = 0
            master_timeout_secs = 5
            worker_timeout_secs = 5
            poll_interval_secs = 0
            "#,
            virsh = virsh_path.display(),
            oc = oc_path.display(),
        );
        fs::write(sandbox.config_path(), config).expect("failed to write config");
        sandbox
    }

    fn write_stub(&self, name: &str, template: &str) -> PathBuf {
        let path = self.dir.join(name);
        let body = template.replace("@DIR@", &self.dir.display().to_string());
        fs::write(&path, body).expect("failed to write stub");
        path
    }

    pub(crate) fn config_path(&self) -> PathBuf {
        self.dir.join("powernodes.toml")
    }

    /// Sets the recorded hypervisor state of a domain.
    pub(crate) fn set_domain_state(&self, domain: &str, state: &str) {
        fs::write(self.dir.join(format!("{domain}.state")), format!("{state}\n"))
            .expect("failed to write state");
    }

    pub(crate) fn domain_state(&self, domain: &str) -> String {
        read_trimmed(&self.dir.join(format!("{domain}.state")))
    }

    /// Lines the hypervisor stub logged, one `<verb> <domain>` per call.
    pub(crate) fn virsh_log(&self) -> Vec<String> {
        read_lines(&self.dir.join("virsh.log"))
    }

    /// Argument lists the cluster CLI stub logged.
    pub(crate) fn oc_log(&self) -> Vec<String> {
        read_lines(&self.dir.join("oc.log"))
    }

    /// Runs the binary with this sandbox's config.
    pub(crate) fn run(&self, args: &[&str]) -> Output {
        Command::new(powernodes_bin_path())
            .arg("--config")
            .arg(self.config_path())
            .args(args)
            .env_remove("POWERNODES_CONFIG")
            .env("RUST_LOG", "info")
            .output()
            .expect("failed to run powernodes")
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        drop(fs::remove_dir_all(&self.dir));
    }
}

fn read_trimmed(path: &Path) -> String {
    fs::read_to_string(path)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
