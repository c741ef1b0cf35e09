//! Miner supervision over the OS process table
//!
//! The supervisor has no memory of what it previously did: every operation
//! re-discovers the miner by scanning `/proc/<pid>/cmdline` for the
//! configured executable string, so it tolerates its own restarts and
//! external interference (someone manually starting or killing the miner).

use async_trait::async_trait;
use nix::sys::signal::Signal;
use std::path::Path;
use tracing::{debug, info};

use peakpause_config::MinerSettings;
use peakpause_host_api::{HostResult, MinerHost, STOP_GRACE_PERIOD};

use crate::process::{signal_pid, spawn_miner};

/// Linux miner supervisor
pub struct MinerSupervisor {
    miner: MinerSettings,
}

impl MinerSupervisor {
    pub fn new(miner: MinerSettings) -> Self {
        Self { miner }
    }

    fn scan_pids(&self) -> Vec<u32> {
        scan_proc(Path::new("/proc"), &self.miner.executable)
    }
}

#[async_trait]
impl MinerHost for MinerSupervisor {
    fn scan(&self) -> Vec<u32> {
        self.scan_pids()
    }

    fn find_miner(&self) -> Option<u32> {
        let pids = self.scan_pids();
        let canonical = *pids.first()?;

        // Self-heal duplicate-spawn situations: keep the first (lowest pid)
        // instance, terminate the rest best-effort.
        for &pid in &pids[1..] {
            match signal_pid(pid, Signal::SIGTERM) {
                Ok(()) => info!(pid, canonical, "Killed duplicate miner process"),
                Err(e) => debug!(pid, error = %e, "Duplicate cleanup signal failed"),
            }
        }

        Some(canonical)
    }

    async fn start(&self) -> HostResult<()> {
        if self.is_running() {
            info!("Miner already running");
            return Ok(());
        }

        let pid = spawn_miner(&self.miner.executable, &self.miner.args, &self.miner.log_file)?;
        info!(pid, executable = %self.miner.executable, "Started miner process");
        Ok(())
    }

    async fn stop(&self) -> HostResult<()> {
        let Some(pid) = self.find_miner() else {
            info!("No miner process to stop");
            return Ok(());
        };

        // Two-phase shutdown: graceful first so the miner can flush state,
        // then an unconditional kill for unresponsive processes.
        signal_pid(pid, Signal::SIGTERM)?;
        tokio::time::sleep(STOP_GRACE_PERIOD).await;
        signal_pid(pid, Signal::SIGKILL)?;

        info!(pid, "Stopped miner process");
        Ok(())
    }
}

/// List pids under `root` whose command line contains `needle`, sorted
/// ascending. The scanning process itself is excluded.
fn scan_proc(root: &Path, needle: &str) -> Vec<u32> {
    let own_pid = std::process::id();
    let mut pids = Vec::new();

    let Ok(entries) = std::fs::read_dir(root) else {
        return pids;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Ok(pid) = name.to_string_lossy().parse::<u32>() else {
            continue;
        };
        if pid == own_pid {
            continue;
        }

        let Ok(raw) = std::fs::read(entry.path().join("cmdline")) else {
            continue;
        };
        if raw.is_empty() {
            // Kernel threads have no command line.
            continue;
        }

        let cmdline = String::from_utf8_lossy(&raw).replace('\0', " ");
        if cmdline.contains(needle) {
            pids.push(pid);
        }
    }

    pids.sort_unstable();
    pids
}
