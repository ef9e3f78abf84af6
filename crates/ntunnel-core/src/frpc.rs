//! frpc client configuration rendering.
//!
//! The supervised binary reads its own TOML dialect (frp v0.5x key names:
//! `serverAddr`, `serverPort`, `auth.token`, `[[proxies]]`). We render it by
//! hand rather than going through a serializer so the output matches what
//! frp documents, and we never parse it back.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::TunnelConfig;
use crate::error::Result;
use crate::paths::StateDir;

/// Render the frpc client configuration for `config`.
pub fn render_client_config(config: &TunnelConfig) -> String {
    let mut out = String::new();

    // Infallible writes to a String.
    let _ = writeln!(out, "serverAddr = {:?}", config.server_addr);
    let _ = writeln!(out, "serverPort = {}", config.server_port);
    if let Some(token) = &config.auth_token {
        let _ = writeln!(out, "auth.token = {token:?}");
    }

    for proxy in &config.proxies {
        let _ = writeln!(out);
        let _ = writeln!(out, "[[proxies]]");
        let _ = writeln!(out, "name = {:?}", proxy.name);
        let _ = writeln!(out, "type = {:?}", proxy.protocol.to_string());
        let _ = writeln!(out, "localPort = {}", proxy.local_port);
        if let Some(remote_port) = proxy.remote_port {
            let _ = writeln!(out, "remotePort = {remote_port}");
        }
    }

    out
}

/// Write the rendered client config into the state directory and return its
/// path, suitable for `frpc -c <path>`.
pub fn write_client_config(dir: &StateDir, config: &TunnelConfig) -> Result<PathBuf> {
    dir.ensure()?;
    let path = dir.client_config_path();
    std::fs::write(&path, render_client_config(config))?;
    tracing::debug!(path = %path.display(), "client config written");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Protocol, ProxyRule};

    fn base_config() -> TunnelConfig {
        TunnelConfig {
            server_addr: "relay.example.com".into(),
            server_port: 7000,
            auth_token: None,
            proxies: Vec::new(),
        }
    }

    #[test]
    fn minimal_config_has_no_token_or_proxies() {
        let rendered = render_client_config(&base_config());
        assert_eq!(rendered, "serverAddr = \"relay.example.com\"\nserverPort = 7000\n");
    }

    #[test]
    fn token_rendered_under_auth_key() {
        let mut config = base_config();
        config.auth_token = Some("s3cret".into());
        let rendered = render_client_config(&config);
        assert!(rendered.contains("auth.token = \"s3cret\""));
    }

    #[test]
    fn proxies_render_as_array_of_tables() {
        let mut config = base_config();
        config.proxies = vec![
            ProxyRule {
                name: "web".into(),
                protocol: Protocol::Tcp,
                local_port: 8080,
                remote_port: Some(18080),
            },
            ProxyRule {
                name: "dns".into(),
                protocol: Protocol::Udp,
                local_port: 5353,
                remote_port: None,
            },
        ];

        let rendered = render_client_config(&config);
        assert_eq!(rendered.matches("[[proxies]]").count(), 2);
        assert!(rendered.contains("name = \"web\""));
        assert!(rendered.contains("type = \"tcp\""));
        assert!(rendered.contains("localPort = 8080"));
        assert!(rendered.contains("remotePort = 18080"));
        assert!(rendered.contains("type = \"udp\""));
        // No remotePort line for the udp rule
        assert_eq!(rendered.matches("remotePort").count(), 1);
    }

    #[test]
    fn write_creates_file_in_state_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::at(tmp.path().join("state"));
        let path = write_client_config(&dir, &base_config()).unwrap();
        assert_eq!(path, dir.client_config_path());
        assert!(std::fs::read_to_string(path).unwrap().contains("serverAddr"));
    }
}
