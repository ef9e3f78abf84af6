//! frp release artifact naming.
//!
//! frp publishes GitHub release archives named
//! `frp_{version}_{os}_{arch}.tar.gz` (`.zip` on Windows), each containing
//! a single `frp_{version}_{os}_{arch}/` directory with `frpc` and `frps`
//! inside. We only ever extract `frpc`.

use ntunnel_core::paths::CLIENT_BINARY_NAME;

use crate::platform::Platform;

/// Pinned frp release we download when no binary is present.
pub const DEFAULT_VERSION: &str = "0.61.1";

/// GitHub repository the client is fetched from.
pub const DEFAULT_REPO: &str = "fatedier/frp";

/// Archive file name for a version/platform pair.
pub fn archive_name(version: &str, platform: &Platform) -> String {
    format!(
        "frp_{version}_{}_{}.{}",
        platform.os,
        platform.arch,
        platform.ext()
    )
}

/// Full GitHub release download URL.
pub fn download_url(repo: &str, version: &str, platform: &Platform) -> String {
    format!(
        "https://github.com/{repo}/releases/download/v{version}/{}",
        archive_name(version, platform)
    )
}

/// Path of the client binary inside the release archive.
pub fn archive_member(version: &str, platform: &Platform) -> String {
    format!(
        "frp_{version}_{}_{}/{CLIENT_BINARY_NAME}",
        platform.os, platform.arch
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    #[test]
    fn download_url_linux() {
        let p = Platform { os: Os::Linux, arch: Arch::Amd64 };
        assert_eq!(
            download_url(DEFAULT_REPO, "0.61.1", &p),
            "https://github.com/fatedier/frp/releases/download/v0.61.1/frp_0.61.1_linux_amd64.tar.gz"
        );
    }

    #[test]
    fn download_url_windows() {
        let p = Platform { os: Os::Windows, arch: Arch::Amd64 };
        assert_eq!(
            download_url(DEFAULT_REPO, "0.61.1", &p),
            "https://github.com/fatedier/frp/releases/download/v0.61.1/frp_0.61.1_windows_amd64.zip"
        );
    }

    #[test]
    #[cfg(not(windows))]
    fn archive_member_includes_release_dir() {
        let p = Platform { os: Os::Linux, arch: Arch::Arm64 };
        assert_eq!(archive_member("0.61.1", &p), "frp_0.61.1_linux_arm64/frpc");
    }
}
