//! State directory layout.
//!
//! All persistent state lives under a single directory, `~/.ntunnel/` by
//! default: the tunnel configuration, the rendered frpc config, the runtime
//! record for the supervised process, the downloaded client binary, and the
//! client's log file.

use std::path::{Path, PathBuf};

/// Name of the client executable we supervise.
#[cfg(windows)]
pub const CLIENT_BINARY_NAME: &str = "frpc.exe";
/// Name of the client executable we supervise.
#[cfg(not(windows))]
pub const CLIENT_BINARY_NAME: &str = "frpc";

/// Resolved locations of everything `ntunnel` persists.
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// State directory under the user's home: `~/.ntunnel/`.
    pub fn discover() -> Option<Self> {
        dirs::home_dir().map(|h| Self { root: h.join(".ntunnel") })
    }

    /// State directory rooted at an explicit path (tests, `--state-dir`).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persisted tunnel configuration: `config.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Rendered frpc client configuration: `frpc.toml`.
    pub fn client_config_path(&self) -> PathBuf {
        self.root.join("frpc.toml")
    }

    /// Runtime record for the supervised process: `runtime.json`.
    pub fn runtime_path(&self) -> PathBuf {
        self.root.join("runtime.json")
    }

    /// Directory holding the downloaded client binary: `bin/`.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Full path of the client binary under [`Self::bin_dir`].
    pub fn client_binary_path(&self) -> PathBuf {
        self.bin_dir().join(CLIENT_BINARY_NAME)
    }

    /// Log file the client's stdout/stderr is redirected to.
    pub fn log_path(&self) -> PathBuf {
        self.root.join("frpc.log")
    }

    /// Create the directory layout. Idempotent.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.bin_dir())
    }
}
