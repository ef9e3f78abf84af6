//! `ntunnel` Core Library
//!
//! Shared functionality for `ntunnel` components:
//! - Tunnel configuration store and validation
//! - frpc client config rendering
//! - State directory layout
//! - Common error types

pub mod config;
pub mod error;
pub mod frpc;
pub mod paths;
pub mod tracing_init;

pub use config::{ConfigStore, Protocol, ProxyRule, TunnelConfig};
pub use error::{Error, Result};
pub use paths::StateDir;
