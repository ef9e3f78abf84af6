//! `ntunnel` Client Fetcher
//!
//! Locates the external frp client binary, downloading a pinned release
//! from GitHub when it is absent: host platform detection, release URL
//! construction, bounded-retry download, sha256 verification, and archive
//! extraction into the state directory.

pub mod extract;
pub mod fetcher;
pub mod platform;
pub mod release;

pub use fetcher::{ClientFetcher, FetchOptions};
pub use platform::{Arch, Os, Platform};
