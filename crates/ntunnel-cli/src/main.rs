//! `ntunnel` CLI
//!
//! Supervises an external frp tunnel client to expose a local service to
//! the public internet: stores the relay configuration, downloads the
//! client binary, and manages its process lifecycle. The frp wire protocol
//! itself is entirely the external binary's business.

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use ntunnel_core::{tracing_init, ConfigStore, StateDir};
use tracing::debug;

use ntunnel_cli::{config_cmd, download_cmd, proxy_cmd, tunnel_cmd};

#[derive(Parser, Debug)]
#[command(name = "ntunnel")]
#[command(version, about = "Tunnel process supervisor for the frp client", long_about = None)]
struct Cli {
    /// State directory (default: ~/.ntunnel)
    #[arg(long, env = "NTUNNEL_STATE_DIR", global = true)]
    state_dir: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation)
    #[arg(long, env = "NTUNNEL_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store the relay server address, port, and optional auth token
    Config {
        /// Relay server address (hostname or IP)
        address: String,
        /// Relay server port (1-65535)
        port: u16,
        /// Authentication token
        token: Option<String>,
    },
    /// Create the state directory layout (idempotent)
    Init,
    /// Manage proxy rules
    #[command(subcommand)]
    Proxy(proxy_cmd::ProxyAction),
    /// Download the external client binary if it is missing
    Download(download_cmd::DownloadArgs),
    /// Start the supervised tunnel client
    Start,
    /// Stop the supervised tunnel client
    Stop,
    /// Restart the supervised tunnel client
    Restart,
    /// Show process state, uptime, and configured proxies
    Status {
        /// Emit the status snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_init::init_tracing("ntunnel=info", cli.log_json);
    debug!(version = env!("CARGO_PKG_VERSION"), "starting ntunnel CLI");

    let dir = match cli.state_dir {
        Some(path) => StateDir::at(path),
        None => StateDir::discover().ok_or_else(|| anyhow!("cannot determine home directory"))?,
    };
    let store = ConfigStore::new(dir);

    match cli.command {
        Command::Config { address, port, token } => {
            config_cmd::run_config(&store, &address, port, token.as_deref())
        }
        Command::Init => config_cmd::run_init(&store),
        Command::Proxy(action) => proxy_cmd::run(&store, action),
        Command::Download(args) => download_cmd::run(&store, args).await,
        Command::Start => tunnel_cmd::run_start(&store).await,
        Command::Stop => tunnel_cmd::run_stop(&store).await,
        Command::Restart => tunnel_cmd::run_restart(&store).await,
        Command::Status { json } => tunnel_cmd::run_status(&store, json),
    }
}
