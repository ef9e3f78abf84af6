//! `ntunnel proxy` subcommands.

use anyhow::Result;
use ntunnel_core::config::{Protocol, ProxyRule};
use ntunnel_core::ConfigStore;

/// Proxy rule management subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum ProxyAction {
    /// Register a proxy rule mapping a local port to the relay.
    Add {
        /// Rule name, unique within the configuration
        name: String,

        /// Forwarded protocol
        #[arg(long, default_value = "tcp", value_parser = parse_protocol)]
        protocol: Protocol,

        /// Local port to expose
        #[arg(long)]
        local_port: u16,

        /// Remote-facing port on the relay (relay-assigned when omitted)
        #[arg(long)]
        remote_port: Option<u16>,
    },
    /// List configured proxy rules.
    List,
    /// Remove a proxy rule by name.
    Remove {
        /// Rule name
        name: String,
    },
}

fn parse_protocol(s: &str) -> Result<Protocol, String> {
    s.parse().map_err(|e: ntunnel_core::Error| e.to_string())
}

/// Execute the `proxy` subcommand.
#[allow(clippy::print_stdout)]
pub fn run(store: &ConfigStore, action: ProxyAction) -> Result<()> {
    match action {
        ProxyAction::Add { name, protocol, local_port, remote_port } => {
            let config = store.add_proxy(ProxyRule { name: name.clone(), protocol, local_port, remote_port })?;
            println!("Proxy rule {name:?} added ({} rule(s) total).", config.proxies.len());
            println!("Restart the tunnel to apply: ntunnel restart");
        }
        ProxyAction::List => {
            let config = store.load()?;
            if config.proxies.is_empty() {
                println!("No proxy rules configured.");
            }
            for rule in &config.proxies {
                let remote = rule
                    .remote_port
                    .map_or_else(|| "(assigned by relay)".to_string(), |p| p.to_string());
                println!("{}  {} {} -> {remote}", rule.name, rule.protocol, rule.local_port);
            }
        }
        ProxyAction::Remove { name } => {
            store.remove_proxy(&name)?;
            println!("Proxy rule {name:?} removed.");
        }
    }
    Ok(())
}
