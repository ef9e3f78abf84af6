//! `ntunnel start|stop|restart|status`.

use anyhow::Result;
use ntunnel_core::ConfigStore;
use ntunnel_fetch::{ClientFetcher, FetchOptions};
use ntunnel_supervisor::{ProcessSupervisor, StatusReporter};

/// Start the tunnel client, downloading it first when absent.
#[allow(clippy::print_stdout)]
pub async fn run_start(store: &ConfigStore) -> Result<()> {
    // Validate the configuration before any network work.
    store.load()?;

    let fetcher = ClientFetcher::new(store.state_dir().clone(), FetchOptions::default())?;
    let client = fetcher.ensure_client_binary().await?;

    let supervisor = ProcessSupervisor::new(store.clone(), client);
    let state = supervisor.start().await?;
    println!("Tunnel client {state}.");
    Ok(())
}

/// Stop the tunnel client.
#[allow(clippy::print_stdout)]
pub async fn run_stop(store: &ConfigStore) -> Result<()> {
    let supervisor = supervisor_for(store);
    let state = supervisor.stop().await?;
    println!("Tunnel client {state}.");
    Ok(())
}

/// Restart the tunnel client.
#[allow(clippy::print_stdout)]
pub async fn run_restart(store: &ConfigStore) -> Result<()> {
    store.load()?;
    let supervisor = supervisor_for(store);
    let state = supervisor.restart().await?;
    println!("Tunnel client {state}.");
    Ok(())
}

/// Print the cached status snapshot.
#[allow(clippy::print_stdout)]
pub fn run_status(store: &ConfigStore, json: bool) -> Result<()> {
    let status = StatusReporter::new(store.clone()).report();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match (status.pid, status.uptime_secs) {
        (Some(pid), Some(up)) => println!("State:  {} (pid {pid}, up {up}s)", status.state),
        _ => println!("State:  {}", status.state),
    }
    match &status.server {
        Some(server) => println!("Server: {server}"),
        None => println!("Server: (not configured)"),
    }
    if status.proxies.is_empty() {
        println!("Proxies: none");
    } else {
        println!("Proxies:");
        for rule in &status.proxies {
            let remote = rule
                .remote_port
                .map_or_else(|| "(assigned by relay)".to_string(), |p| p.to_string());
            println!("  {}  {} {} -> {remote}", rule.name, rule.protocol, rule.local_port);
        }
    }
    Ok(())
}

fn supervisor_for(store: &ConfigStore) -> ProcessSupervisor {
    let client = store.state_dir().client_binary_path();
    ProcessSupervisor::new(store.clone(), client)
}
