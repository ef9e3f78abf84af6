//! Host platform detection for release downloads.

use ntunnel_core::{Error, Result};

/// OS/architecture pair a client release is published for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Darwin => write!(f, "darwin"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amd64 => write!(f, "amd64"),
            Self::Arm64 => write!(f, "arm64"),
        }
    }
}

impl Platform {
    /// Archive extension for this platform.
    pub const fn ext(&self) -> &'static str {
        match self.os {
            Os::Windows => "zip",
            _ => "tar.gz",
        }
    }

    /// Detect the compile-time host platform.
    ///
    /// Fails with `UnsupportedPlatform` when frp publishes no matching
    /// release artifact.
    pub fn host() -> Result<Self> {
        let os = if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::Darwin
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            return Err(Error::UnsupportedPlatform(host_triple()));
        };

        let arch = if cfg!(target_arch = "x86_64") {
            Arch::Amd64
        } else if cfg!(target_arch = "aarch64") {
            Arch::Arm64
        } else {
            return Err(Error::UnsupportedPlatform(host_triple()));
        };

        Ok(Self { os, arch })
    }
}

fn host_triple() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_detection_succeeds_on_supported_targets() {
        // CI and dev machines are all linux/darwin/windows on amd64/arm64.
        let p = Platform::host();
        if cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows"))
            && cfg!(any(target_arch = "x86_64", target_arch = "aarch64"))
        {
            assert!(p.is_ok());
        }
    }

    #[test]
    fn windows_uses_zip() {
        let p = Platform { os: Os::Windows, arch: Arch::Amd64 };
        assert_eq!(p.ext(), "zip");
    }

    #[test]
    fn unix_uses_tar_gz() {
        let p = Platform { os: Os::Linux, arch: Arch::Arm64 };
        assert_eq!(p.ext(), "tar.gz");
    }

    #[test]
    fn display_matches_release_naming() {
        assert_eq!(Os::Darwin.to_string(), "darwin");
        assert_eq!(Arch::Arm64.to_string(), "arm64");
    }
}
