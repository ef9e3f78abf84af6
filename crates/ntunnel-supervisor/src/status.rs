//! Cached status reporting.
//!
//! `report` never blocks and never probes the network: it reads the
//! persisted runtime record, refreshes liveness with a zero-signal pid
//! probe, and lists the configured proxies from the stored config.

use ntunnel_core::config::ProxyRule;
use ntunnel_core::{ConfigStore, Error};
use serde::Serialize;

use crate::runtime::{self, ProcessState, RuntimeRecord};

/// Snapshot returned by `ntunnel status`.
#[derive(Debug, Clone, Serialize)]
pub struct TunnelStatus {
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    /// `address:port` of the configured relay, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    pub proxies: Vec<ProxyRule>,
}

/// Read-only view over the supervisor's cached state.
pub struct StatusReporter {
    store: ConfigStore,
}

impl StatusReporter {
    pub const fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    /// Build a status snapshot from cached state only.
    pub fn report(&self) -> TunnelStatus {
        let dir = self.store.state_dir();
        let mut record = RuntimeRecord::load(dir);

        // A recorded pid that is gone means the client exited behind our
        // back; present it as stopped without mutating the record.
        if matches!(record.state, ProcessState::Running | ProcessState::Starting) {
            match record.pid {
                Some(pid) if runtime::pid_alive(pid) => {}
                _ => record = RuntimeRecord::stopped(),
            }
        }

        let (server, proxies) = match self.store.load() {
            Ok(config) => (
                Some(format!("{}:{}", config.server_addr, config.server_port)),
                config.proxies,
            ),
            Err(Error::NotConfigured) => (None, Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read config for status");
                (None, Vec::new())
            }
        };

        TunnelStatus {
            state: record.state,
            pid: record.pid,
            uptime_secs: record.uptime_secs(),
            server,
            proxies,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::runtime::now_secs;
    use ntunnel_core::config::Protocol;
    use ntunnel_core::StateDir;

    fn store(tmp: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(StateDir::at(tmp.path().join("state")))
    }

    #[test]
    fn unconfigured_and_stopped_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let status = StatusReporter::new(store(&tmp)).report();
        assert_eq!(status.state, ProcessState::Stopped);
        assert!(status.server.is_none());
        assert!(status.proxies.is_empty());
        assert!(status.uptime_secs.is_none());
    }

    #[test]
    fn reports_configured_server_and_proxies() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.set_server("relay.example.com", 7000, None).unwrap();
        store
            .add_proxy(ProxyRule {
                name: "web".into(),
                protocol: Protocol::Tcp,
                local_port: 8080,
                remote_port: None,
            })
            .unwrap();

        let status = StatusReporter::new(store).report();
        assert_eq!(status.server.as_deref(), Some("relay.example.com:7000"));
        assert_eq!(status.proxies.len(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn dead_recorded_pid_reads_as_stopped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let dir = store.state_dir().clone();
        // pid 1 is never ours to signal; a freshly-exited child pid is hard
        // to fabricate portably, so use a pid from the far end of the range.
        RuntimeRecord {
            state: ProcessState::Running,
            pid: Some(u32::MAX / 2),
            started_at_secs: Some(now_secs()),
        }
        .save(&dir)
        .unwrap();

        let status = StatusReporter::new(store).report();
        assert_eq!(status.state, ProcessState::Stopped);
        assert!(status.pid.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn live_recorded_pid_reads_as_running() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let dir = store.state_dir().clone();
        RuntimeRecord {
            state: ProcessState::Running,
            pid: Some(std::process::id()),
            started_at_secs: Some(now_secs() - 42),
        }
        .save(&dir)
        .unwrap();

        let status = StatusReporter::new(store).report();
        assert_eq!(status.state, ProcessState::Running);
        assert!(status.uptime_secs.unwrap_or(0) >= 42);
    }
}
