//! `ntunnel config` and `ntunnel init`.

use anyhow::Result;
use ntunnel_core::{ConfigStore, Error};

/// Store the relay server settings.
#[allow(clippy::print_stdout)]
pub fn run_config(store: &ConfigStore, address: &str, port: u16, token: Option<&str>) -> Result<()> {
    let config = store.set_server(address, port, token)?;
    println!("Tunnel server configured: {}:{}", config.server_addr, config.server_port);
    if config.auth_token.is_some() {
        println!("Auth token stored.");
    }
    if !config.proxies.is_empty() {
        println!("{} existing proxy rule(s) kept.", config.proxies.len());
    }
    Ok(())
}

/// Idempotent setup: create the state directory layout. Never touches
/// stored credentials; supplying those is `config`'s job.
#[allow(clippy::print_stdout)]
pub fn run_init(store: &ConfigStore) -> Result<()> {
    let dir = store.state_dir();
    dir.ensure()?;
    println!("State directory ready: {}", dir.root().display());

    match store.load() {
        Ok(config) => {
            println!("Existing configuration kept ({}:{}).", config.server_addr, config.server_port);
        }
        Err(Error::NotConfigured) => {
            println!("No server configured yet; run `ntunnel config <address> <port>`.");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
