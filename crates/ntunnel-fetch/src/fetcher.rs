//! Client binary acquisition.
//!
//! `ensure_client_binary` is the only entry point: it returns the path of
//! the installed client, downloading and extracting a pinned release when
//! the state directory has none. Network failures are retried a bounded
//! number of times with exponential backoff before surfacing
//! `DownloadFailed`.

use std::path::PathBuf;
use std::time::Duration;

use ntunnel_core::{Error, Result, StateDir};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::extract;
use crate::platform::Platform;
use crate::release;

/// Tunable download behaviour.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// frp release version to download.
    pub version: String,
    /// GitHub repository (`owner/name`).
    pub repo: String,
    /// Per-attempt network timeout.
    pub timeout: Duration,
    /// Additional attempts after the first failure.
    pub retries: u32,
    /// Initial backoff delay; doubles per retry.
    pub backoff: Duration,
    /// Expected sha256 of the release archive (lowercase hex), if pinned.
    pub expected_sha256: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            version: release::DEFAULT_VERSION.to_string(),
            repo: release::DEFAULT_REPO.to_string(),
            timeout: Duration::from_secs(30),
            retries: 3,
            backoff: Duration::from_millis(500),
            expected_sha256: None,
        }
    }
}

/// Locates or downloads the external client binary.
pub struct ClientFetcher {
    dir: StateDir,
    options: FetchOptions,
    http: reqwest::Client,
}

impl ClientFetcher {
    pub fn new(dir: StateDir, options: FetchOptions) -> Result<Self> {
        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed — safe to ignore.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::DownloadFailed(format!("http client init: {e}")))?;

        Ok(Self { dir, options, http })
    }

    /// Path the client binary is (or will be) installed at.
    pub fn client_path(&self) -> PathBuf {
        self.dir.client_binary_path()
    }

    /// Return the client binary path, downloading the release when absent.
    pub async fn ensure_client_binary(&self) -> Result<PathBuf> {
        let path = self.client_path();
        if path.exists() {
            return Ok(path);
        }

        let platform = Platform::host()?;
        let url = release::download_url(&self.options.repo, &self.options.version, &platform);
        info!(%url, "client binary missing, downloading release");

        let archive = self.download_with_retry(&url).await?;
        verify_sha256(&archive, self.options.expected_sha256.as_deref())?;

        self.dir.ensure()?;
        extract::extract_client(&archive, &platform, &path)?;
        Ok(path)
    }

    async fn download_with_retry(&self, url: &str) -> Result<Vec<u8>> {
        let mut delay = self.options.backoff;
        let mut last_err = Error::DownloadFailed("no download attempts were made".into());

        for attempt in 0..=self.options.retries {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            match self.download_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    warn!(attempt, error = %e, "release download attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn download_once(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::DownloadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::DownloadFailed(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::DownloadFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Verify the archive against a pinned sha256, when one is configured.
fn verify_sha256(bytes: &[u8], expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let digest = Sha256::digest(bytes);
    let actual: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    if actual != expected.to_ascii_lowercase() {
        return Err(Error::DownloadFailed(format!(
            "sha256 mismatch: expected {expected}, got {actual}"
        )));
    }
    Ok(())
}
