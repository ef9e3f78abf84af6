//! `ntunnel download`.

use std::time::Duration;

use anyhow::Result;
use ntunnel_core::ConfigStore;
use ntunnel_fetch::{release, ClientFetcher, FetchOptions};

/// Options for fetching the external client binary.
#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// frp release version to download
    #[arg(long, default_value = release::DEFAULT_VERSION)]
    client_version: String,

    /// Expected sha256 of the release archive (lowercase hex)
    #[arg(long)]
    sha256: Option<String>,

    /// Per-attempt network timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Retry attempts after the first failure
    #[arg(long, default_value_t = 3)]
    retries: u32,
}

impl DownloadArgs {
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            version: self.client_version.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            expected_sha256: self.sha256.clone(),
            ..FetchOptions::default()
        }
    }
}

/// Download the client binary when absent.
#[allow(clippy::print_stdout)]
pub async fn run(store: &ConfigStore, args: DownloadArgs) -> Result<()> {
    let fetcher = ClientFetcher::new(store.state_dir().clone(), args.fetch_options())?;
    let already_present = fetcher.client_path().exists();

    let path = fetcher.ensure_client_binary().await?;
    if already_present {
        println!("Client binary already present: {}", path.display());
    } else {
        println!("Client binary installed: {}", path.display());
    }
    Ok(())
}
