//! `ntunnel` CLI Library
//!
//! Command implementations behind the `ntunnel` binary: server
//! configuration, proxy rule management, client download, and lifecycle
//! control of the supervised process.

pub mod config_cmd;
pub mod download_cmd;
pub mod proxy_cmd;
pub mod tunnel_cmd;
