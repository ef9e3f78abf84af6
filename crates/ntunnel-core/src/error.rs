//! Error types for `ntunnel` operations.

use thiserror::Error;

/// Result type alias using `ntunnel` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy shared by every `ntunnel` component.
///
/// All variants surface to the CLI as a human-readable message plus a
/// nonzero exit code. None of them is fatal beyond the tunnel feature.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected configuration input (empty address, port 0, bad rule).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A lifecycle operation was attempted before `config` was run.
    #[error("tunnel server is not configured; run `ntunnel config <address> <port>` first")]
    NotConfigured,

    /// A proxy rule with this name already exists.
    #[error("a proxy rule named {0:?} already exists")]
    DuplicateProxyName(String),

    /// Network or checksum failure fetching the client binary.
    #[error("client download failed: {0}")]
    DownloadFailed(String),

    /// No tunnel client release exists for the host OS/architecture.
    #[error("no tunnel client build is published for this platform ({0})")]
    UnsupportedPlatform(String),

    /// The client binary could not be executed, or exited during startup.
    #[error("failed to launch tunnel client: {0}")]
    LaunchFailed(String),

    /// The client survived both the graceful wait and the forced kill.
    #[error("tunnel client did not exit within {timeout_secs}s")]
    StopTimeout { timeout_secs: u64 },

    /// TOML serialization error
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// TOML deserialization error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
