//! Persisted runtime record for the supervised process.
//!
//! The record (`runtime.json` in the state directory) is the cached state
//! every CLI invocation reads: pid, start time, and the last known state.
//! Only the supervisor writes it; `status` reads it without locking.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use ntunnel_core::{Result, StateDir};
use serde::{Deserialize, Serialize};

/// Last known state of the supervised client process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Failed,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Cached supervised-process state, shared across CLI invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeRecord {
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_secs: Option<u64>,
}

impl RuntimeRecord {
    pub const fn stopped() -> Self {
        Self { state: ProcessState::Stopped, pid: None, started_at_secs: None }
    }

    /// Load the record; a missing or unreadable file means Stopped.
    pub fn load(dir: &StateDir) -> Self {
        std::fs::read_to_string(dir.runtime_path())
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_else(Self::stopped)
    }

    pub fn save(&self, dir: &StateDir) -> Result<()> {
        dir.ensure()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.runtime_path(), json)?;
        Ok(())
    }

    /// Seconds since the recorded start, when the process is up.
    pub fn uptime_secs(&self) -> Option<u64> {
        if !matches!(self.state, ProcessState::Running | ProcessState::Starting) {
            return None;
        }
        let started = self.started_at_secs?;
        Some(now_secs().saturating_sub(started))
    }
}

/// Wall-clock seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Zero-signal probe: is the recorded pid still alive?
#[cfg(unix)]
pub fn pid_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

/// On non-Unix targets we have no cheap probe; trust the recorded state.
#[cfg(not(unix))]
pub fn pid_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_stopped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::at(tmp.path().join("state"));
        let record = RuntimeRecord::load(&dir);
        assert_eq!(record.state, ProcessState::Stopped);
        assert!(record.pid.is_none());
    }

    #[test]
    fn corrupt_file_loads_as_stopped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::at(tmp.path().join("state"));
        dir.ensure().unwrap();
        std::fs::write(dir.runtime_path(), "{not json").unwrap();
        assert_eq!(RuntimeRecord::load(&dir).state, ProcessState::Stopped);
    }

    #[test]
    fn record_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::at(tmp.path().join("state"));
        let record = RuntimeRecord {
            state: ProcessState::Running,
            pid: Some(4321),
            started_at_secs: Some(now_secs()),
        };
        record.save(&dir).unwrap();

        let loaded = RuntimeRecord::load(&dir);
        assert_eq!(loaded.state, ProcessState::Running);
        assert_eq!(loaded.pid, Some(4321));
    }

    #[test]
    fn uptime_only_while_up() {
        let mut record = RuntimeRecord {
            state: ProcessState::Running,
            pid: Some(1),
            started_at_secs: Some(now_secs() - 10),
        };
        assert!(record.uptime_secs().unwrap_or(0) >= 10);

        record.state = ProcessState::Stopped;
        assert!(record.uptime_secs().is_none());
    }

    #[test]
    #[cfg(unix)]
    fn own_pid_is_alive() {
        assert!(pid_alive(std::process::id()));
    }
}
