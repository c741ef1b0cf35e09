//! Process management utilities

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

use peakpause_host_api::{HostError, HostResult};

/// Lowest user-assignable scheduling priority. The miner must never starve
/// interactive or system work.
pub const MINER_NICENESS: i32 = 19;

/// Spawn the miner detached in its own session at the lowest scheduling
/// priority, with stdout/stderr appended to `log_file`. Returns the child
/// pid; the child is discovered through the process table afterwards, never
/// through this handle.
pub fn spawn_miner(executable: &str, args: &[String], log_file: &Path) -> HostResult<u32> {
    let stdout_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| {
            HostError::SpawnFailed(format!(
                "Failed to open miner log {}: {}",
                log_file.display(),
                e
            ))
        })?;
    let stderr_log = stdout_log.try_clone()?;

    let mut cmd = Command::new(executable);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_log))
        .stderr(Stdio::from(stderr_log));

    // Detach into a fresh session and drop the priority before exec.
    // SAFETY: setsid and setpriority are both async-signal-safe.
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            if nix::libc::setpriority(nix::libc::PRIO_PROCESS, 0, MINER_NICENESS) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = cmd
        .spawn()
        .map_err(|e| HostError::SpawnFailed(format!("Failed to spawn {}: {}", executable, e)))?;

    let pid = child.id();
    debug!(pid, program = %executable, niceness = MINER_NICENESS, "Miner process spawned");

    Ok(pid)
}

/// Send a signal to a pid, treating "process already gone" as success.
pub fn signal_pid(pid: u32, sig: Signal) -> HostResult<()> {
    match signal::kill(Pid::from_raw(pid as i32), sig) {
        Ok(()) => {
            debug!(pid, signal = %sig, "Signal sent");
            Ok(())
        }
        Err(nix::errno::Errno::ESRCH) => {
            // Process already gone
            Ok(())
        }
        Err(e) => Err(HostError::StopFailed(format!(
            "Failed to send {} to pid {}: {}",
            sig, pid, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_writes_output_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("miner.log");

        let pid = spawn_miner("echo", &["hello".to_string()], &log).unwrap();
        assert!(pid > 0);

        // Give the child a moment to run and flush.
        std::thread::sleep(std::time::Duration::from_millis(200));

        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.contains("hello"));
    }

    #[test]
    fn spawn_missing_executable_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("miner.log");

        let result = spawn_miner("/nonexistent/miner-binary", &[], &log);
        assert!(matches!(result, Err(HostError::SpawnFailed(_))));
    }

    #[test]
    fn spawned_process_runs_at_lowest_priority() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("miner.log");
        let pid = spawn_miner("sleep", &["2".to_string()], &log).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(100));

        // /proc/<pid>/stat: nice is field 19; fields 3.. start after the
        // parenthesized comm.
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).unwrap();
        let rest = &stat[stat.rfind(')').unwrap() + 2..];
        let nice: i32 = rest.split_whitespace().nth(16).unwrap().parse().unwrap();
        assert_eq!(nice, MINER_NICENESS);

        signal_pid(pid, Signal::SIGKILL).unwrap();
    }

    #[test]
    fn signal_to_dead_pid_is_success() {
        // Spawn something short-lived, let it exit, then signal it.
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("miner.log");
        let pid = spawn_miner("true", &[], &log).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(200));

        // The session leader has exited; ESRCH (or a reaped zombie that
        // still accepts the signal) must not surface as an error.
        signal_pid(pid, Signal::SIGTERM).unwrap();
    }
}
