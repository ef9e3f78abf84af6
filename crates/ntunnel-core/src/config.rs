//! Tunnel configuration store.
//!
//! Persists the relay server address/port/token and the proxy rule list to
//! `config.toml` inside the state directory. The server fields are
//! overwritten wholesale by each `config` invocation; proxy rules are
//! managed individually and survive reconfiguration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::StateDir;

/// Transport protocol a proxy rule forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(Error::InvalidConfig(format!(
                "unknown protocol {other:?} (expected tcp or udp)"
            ))),
        }
    }
}

/// A single local-port-to-relay mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRule {
    /// Unique name within the configuration.
    pub name: String,
    pub protocol: Protocol,
    pub local_port: u16,
    /// Remote-facing port on the relay; the relay picks one when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<u16>,
}

impl ProxyRule {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("proxy rule name must not be empty".into()));
        }
        if self.local_port == 0 {
            return Err(Error::InvalidConfig(format!(
                "proxy rule {:?} has local port 0",
                self.name
            )));
        }
        if self.remote_port == Some(0) {
            return Err(Error::InvalidConfig(format!(
                "proxy rule {:?} has remote port 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Persistent tunnel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// Relay server address (hostname or IP).
    pub server_addr: String,
    /// Relay server control port (1-65535).
    pub server_port: u16,
    /// Authentication token, if the relay requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Proxy rules registered with the relay on start.
    #[serde(default)]
    pub proxies: Vec<ProxyRule>,
}

impl TunnelConfig {
    /// Check the invariants `start` relies on.
    pub fn validate(&self) -> Result<()> {
        if self.server_addr.trim().is_empty() {
            return Err(Error::InvalidConfig("server address must not be empty".into()));
        }
        if self.server_port == 0 {
            return Err(Error::InvalidConfig("server port must be in 1-65535".into()));
        }
        for rule in &self.proxies {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Reads and writes the persisted [`TunnelConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: StateDir,
}

impl ConfigStore {
    pub const fn new(dir: StateDir) -> Self {
        Self { dir }
    }

    pub const fn state_dir(&self) -> &StateDir {
        &self.dir
    }

    /// Store the relay server settings, preserving any existing proxy rules.
    pub fn set_server(&self, address: &str, port: u16, token: Option<&str>) -> Result<TunnelConfig> {
        let proxies = match self.load() {
            Ok(existing) => existing.proxies,
            Err(Error::NotConfigured) => Vec::new(),
            Err(e) => return Err(e),
        };

        let config = TunnelConfig {
            server_addr: address.to_string(),
            server_port: port,
            auth_token: token.map(ToString::to_string),
            proxies,
        };
        config.validate()?;
        self.save(&config)?;
        tracing::info!(server = %address, port, "tunnel server configured");
        Ok(config)
    }

    /// Load the stored configuration, or `NotConfigured` if none exists.
    pub fn load(&self) -> Result<TunnelConfig> {
        let path = self.dir.config_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotConfigured);
            }
            Err(e) => return Err(e.into()),
        };
        let config: TunnelConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Register a proxy rule. The existing rule set is left untouched when
    /// the name collides or the rule is invalid.
    pub fn add_proxy(&self, rule: ProxyRule) -> Result<TunnelConfig> {
        rule.validate()?;
        let mut config = self.load()?;
        if config.proxies.iter().any(|p| p.name == rule.name) {
            return Err(Error::DuplicateProxyName(rule.name));
        }
        config.proxies.push(rule);
        self.save(&config)?;
        Ok(config)
    }

    /// Remove a proxy rule by name.
    pub fn remove_proxy(&self, name: &str) -> Result<TunnelConfig> {
        let mut config = self.load()?;
        let before = config.proxies.len();
        config.proxies.retain(|p| p.name != name);
        if config.proxies.len() == before {
            return Err(Error::InvalidConfig(format!("no proxy rule named {name:?}")));
        }
        self.save(&config)?;
        Ok(config)
    }

    fn save(&self, config: &TunnelConfig) -> Result<()> {
        self.dir.ensure()?;
        let content = toml::to_string_pretty(config)?;
        std::fs::write(self.dir.config_path(), content)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(tmp: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(StateDir::at(tmp.path().join("state")))
    }

    #[test]
    fn set_server_then_load_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.set_server("relay.example.com", 7000, Some("s3cret")).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.server_addr, "relay.example.com");
        assert_eq!(loaded.server_port, 7000);
        assert_eq!(loaded.auth_token.as_deref(), Some("s3cret"));
        assert!(loaded.proxies.is_empty());
    }

    #[test]
    fn port_zero_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let err = store(&tmp).set_server("relay.example.com", 0, None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn empty_address_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let err = store(&tmp).set_server("  ", 7000, None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn load_without_config_is_not_configured() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(store(&tmp).load().unwrap_err(), Error::NotConfigured));
    }

    #[test]
    fn reconfigure_overwrites_server_but_keeps_proxies() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.set_server("relay.example.com", 7000, Some("a")).unwrap();
        store
            .add_proxy(ProxyRule {
                name: "web".into(),
                protocol: Protocol::Tcp,
                local_port: 8080,
                remote_port: Some(18080),
            })
            .unwrap();

        store.set_server("relay2.example.com", 7001, None).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.server_addr, "relay2.example.com");
        assert!(loaded.auth_token.is_none());
        assert_eq!(loaded.proxies.len(), 1);
        assert_eq!(loaded.proxies[0].name, "web");
    }

    #[test]
    fn duplicate_proxy_name_rejected_first_rule_intact() {
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

        let err = store
            .add_proxy(ProxyRule {
                name: "web".into(),
                protocol: Protocol::Udp,
                local_port: 9999,
                remote_port: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateProxyName(name) if name == "web"));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.proxies.len(), 1);
        assert_eq!(loaded.proxies[0].protocol, Protocol::Tcp);
        assert_eq!(loaded.proxies[0].local_port, 8080);
    }

    #[test]
    fn remove_proxy_unknown_name_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.set_server("relay.example.com", 7000, None).unwrap();
        assert!(store.remove_proxy("nope").is_err());
    }

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("kcp".parse::<Protocol>().is_err());
    }
}
