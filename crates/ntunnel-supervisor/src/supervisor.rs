//! Client subprocess lifecycle.
//!
//! Spawning, liveness observation, and graceful shutdown of the external
//! frp client process. `start`/`stop`/`restart` serialize behind one async
//! mutex that also owns the child handle; the persisted runtime record is
//! the only state `status` reads.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use ntunnel_core::{frpc, ConfigStore, Error, Result, StateDir};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::runtime::{self, now_secs, ProcessState, RuntimeRecord};

/// How often liveness is polled during readiness and stop waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra wait after a forced kill before giving up entirely.
const KILL_GRACE: Duration = Duration::from_secs(1);

/// Tunable supervision behaviour.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Liveness window: the client counts as Running once it has survived
    /// this long after spawn.
    pub readiness_grace: Duration,
    /// Bounded wait for graceful exit before the forced-kill fallback.
    pub stop_timeout: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            readiness_grace: Duration::from_secs(2),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Owns the supervised client process. No other component signals or reaps
/// it.
pub struct ProcessSupervisor {
    store: ConfigStore,
    client_bin: PathBuf,
    options: SupervisorOptions,
    /// Serializes lifecycle operations and holds the child handle when the
    /// client was spawned by this process.
    lifecycle: Mutex<Option<Child>>,
}

impl ProcessSupervisor {
    pub fn new(store: ConfigStore, client_bin: PathBuf) -> Self {
        Self::with_options(store, client_bin, SupervisorOptions::default())
    }

    pub fn with_options(store: ConfigStore, client_bin: PathBuf, options: SupervisorOptions) -> Self {
        Self { store, client_bin, options, lifecycle: Mutex::new(None) }
    }

    const fn state_dir(&self) -> &StateDir {
        self.store.state_dir()
    }

    /// Launch the client with the stored configuration.
    ///
    /// No-op returning the current state when the client is already up.
    pub async fn start(&self) -> Result<ProcessState> {
        let mut guard = self.lifecycle.lock().await;
        self.start_locked(&mut guard).await
    }

    /// Stop the supervised client: termination signal, bounded wait, forced
    /// kill. No-op returning Stopped when nothing is running.
    pub async fn stop(&self) -> Result<ProcessState> {
        let mut guard = self.lifecycle.lock().await;
        self.stop_locked(&mut guard).await
    }

    /// Stop followed by start, under a single lifecycle lock.
    pub async fn restart(&self) -> Result<ProcessState> {
        let mut guard = self.lifecycle.lock().await;
        self.stop_locked(&mut guard).await?;
        self.start_locked(&mut guard).await
    }

    async fn start_locked(&self, owned: &mut Option<Child>) -> Result<ProcessState> {
        // Idempotence within this process: a live owned child wins.
        if let Some(child) = owned.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                debug!("client already running (owned)");
                return Ok(ProcessState::Running);
            }
            *owned = None;
        }

        let dir = self.state_dir();

        // Idempotence across invocations: a live recorded pid wins.
        let record = RuntimeRecord::load(dir);
        if matches!(record.state, ProcessState::Running | ProcessState::Starting) {
            if let Some(pid) = record.pid {
                if runtime::pid_alive(pid) {
                    debug!(pid, "client already running (recorded)");
                    return Ok(record.state);
                }
            }
        }

        let config = self.store.load()?;

        if !self.client_bin.exists() {
            return Err(Error::LaunchFailed(format!(
                "client binary not found at {}; run `ntunnel download` first",
                self.client_bin.display()
            )));
        }

        let config_path = frpc::write_client_config(dir, &config)?;

        // Redirect client output to the log file so it never interleaves
        // with ours.
        let log = std::fs::File::create(dir.log_path())?;
        let log_err = log.try_clone()?;

        let mut cmd = Command::new(&self.client_bin);
        cmd.arg("-c")
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        // Own process group so the client survives this one-shot process.
        #[cfg(unix)]
        cmd.process_group(0);

        info!(
            bin = %self.client_bin.display(),
            config = %config_path.display(),
            "spawning tunnel client"
        );
        let mut child = cmd.spawn().map_err(|e| {
            Error::LaunchFailed(format!("{}: {e}", self.client_bin.display()))
        })?;

        let pid = child.id();
        let mut record = RuntimeRecord {
            state: ProcessState::Starting,
            pid,
            started_at_secs: Some(now_secs()),
        };
        record.save(dir)?;

        // Readiness window: surviving it is the liveness signal.
        let deadline = tokio::time::Instant::now() + self.options.readiness_grace;
        loop {
            match child.try_wait() {
                Ok(Some(exit)) => {
                    record.state = ProcessState::Failed;
                    record.pid = None;
                    record.save(dir)?;
                    return Err(Error::LaunchFailed(format!(
                        "client exited during startup ({exit}){}",
                        log_tail(dir)
                    )));
                }
                Ok(None) => {}
                Err(e) => {
                    record.state = ProcessState::Failed;
                    record.pid = None;
                    record.save(dir)?;
                    return Err(Error::LaunchFailed(e.to_string()));
                }
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        record.state = ProcessState::Running;
        record.save(dir)?;
        info!(?pid, "tunnel client running");
        *owned = Some(child);
        Ok(ProcessState::Running)
    }

    async fn stop_locked(&self, owned: &mut Option<Child>) -> Result<ProcessState> {
        let dir = self.state_dir();

        // Child spawned by this process: signal it and reap directly.
        if let Some(mut child) = owned.take() {
            if let Some(pid) = child.id() {
                info!(pid, "stopping tunnel client");
                terminate_detached(pid);
            }
            match tokio::time::timeout(self.options.stop_timeout, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(?status, "client exited gracefully");
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "error waiting for client, killing");
                    child.kill().await.ok();
                }
                Err(_) => {
                    warn!("graceful stop timed out, killing");
                    if child.kill().await.is_err() {
                        return Err(Error::StopTimeout {
                            timeout_secs: self.options.stop_timeout.as_secs(),
                        });
                    }
                }
            }
            RuntimeRecord::stopped().save(dir)?;
            return Ok(ProcessState::Stopped);
        }

        // Detached client from an earlier invocation: go by the record.
        let record = RuntimeRecord::load(dir);
        let Some(pid) = record.pid else {
            if record.state != ProcessState::Stopped {
                RuntimeRecord::stopped().save(dir)?;
            }
            return Ok(ProcessState::Stopped);
        };

        if !runtime::pid_alive(pid) {
            RuntimeRecord::stopped().save(dir)?;
            return Ok(ProcessState::Stopped);
        }

        info!(pid, "stopping tunnel client");
        terminate_detached(pid);
        if self.wait_for_exit(pid, self.options.stop_timeout).await {
            RuntimeRecord::stopped().save(dir)?;
            return Ok(ProcessState::Stopped);
        }

        warn!(pid, "graceful stop timed out, killing");
        kill_detached(pid);
        if self.wait_for_exit(pid, KILL_GRACE).await {
            RuntimeRecord::stopped().save(dir)?;
            return Ok(ProcessState::Stopped);
        }

        Err(Error::StopTimeout { timeout_secs: self.options.stop_timeout.as_secs() })
    }

    async fn wait_for_exit(&self, pid: u32, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if !runtime::pid_alive(pid) {
                return true;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        !runtime::pid_alive(pid)
    }
}

/// Last few client log lines, for launch failure messages.
fn log_tail(dir: &StateDir) -> String {
    match std::fs::read_to_string(dir.log_path()) {
        Ok(s) if !s.trim().is_empty() => {
            let tail: Vec<&str> = s.lines().rev().take(5).collect();
            let lines: Vec<&str> = tail.into_iter().rev().collect();
            format!("; last log lines:\n{}", lines.join("\n"))
        }
        _ => String::new(),
    }
}

/// Ask a detached client to exit (SIGTERM on Unix).
#[cfg(unix)]
fn terminate_detached(pid: u32) {
    signal_pid(pid, nix::sys::signal::Signal::SIGTERM);
}

/// Force-kill a detached client (SIGKILL on Unix).
#[cfg(unix)]
fn kill_detached(pid: u32) {
    signal_pid(pid, nix::sys::signal::Signal::SIGKILL);
}

#[cfg(unix)]
fn signal_pid(pid: u32, signal: nix::sys::signal::Signal) {
    let Ok(pid) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), signal) {
        warn!(pid, %signal, error = %e, "failed to signal client");
    }
}

#[cfg(not(unix))]
fn terminate_detached(pid: u32) {
    taskkill(pid, false);
}

#[cfg(not(unix))]
fn kill_detached(pid: u32) {
    taskkill(pid, true);
}

#[cfg(not(unix))]
fn taskkill(pid: u32, force: bool) {
    let mut cmd = std::process::Command::new("taskkill");
    cmd.arg("/PID").arg(pid.to_string());
    if force {
        cmd.arg("/F");
    }
    if let Err(e) = cmd.status() {
        warn!(pid, error = %e, "taskkill failed");
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_options_bound_the_stop_wait() {
        let options = SupervisorOptions::default();
        assert!(options.stop_timeout >= options.readiness_grace);
        assert!(options.stop_timeout <= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn stop_without_anything_running_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::at(tmp.path().join("state"));
        let store = ConfigStore::new(dir);
        let supervisor = ProcessSupervisor::new(store, PathBuf::from("/nonexistent/frpc"));
        assert_eq!(supervisor.stop().await.unwrap(), ProcessState::Stopped);
    }

    #[tokio::test]
    async fn start_without_config_is_not_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::at(tmp.path().join("state"));
        let store = ConfigStore::new(dir);
        let supervisor = ProcessSupervisor::new(store, PathBuf::from("/nonexistent/frpc"));
        assert!(matches!(supervisor.start().await.unwrap_err(), Error::NotConfigured));
    }

    #[tokio::test]
    async fn start_without_binary_is_launch_failed() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::at(tmp.path().join("state"));
        let store = ConfigStore::new(dir);
        store.set_server("relay.example.com", 7000, None).unwrap();

        let supervisor = ProcessSupervisor::new(store, tmp.path().join("missing-frpc"));
        assert!(matches!(supervisor.start().await.unwrap_err(), Error::LaunchFailed(_)));
    }
}
