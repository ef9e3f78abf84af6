//! Release archive extraction.
//!
//! Pulls the single client binary out of a downloaded release archive and
//! installs it at the requested path with the executable bit set.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use ntunnel_core::paths::CLIENT_BINARY_NAME;
use ntunnel_core::{Error, Result};

use crate::platform::{Os, Platform};

/// Extract the client binary from `archive` into `dest`.
///
/// Dispatches on the platform's archive format; fails with `DownloadFailed`
/// when the archive is unreadable or contains no client binary.
pub fn extract_client(archive: &[u8], platform: &Platform, dest: &Path) -> Result<()> {
    match platform.os {
        Os::Windows => extract_zip(archive, dest),
        Os::Linux | Os::Darwin => extract_tar_gz(archive, dest),
    }?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))?;
    }

    tracing::info!(path = %dest.display(), "client binary installed");
    Ok(())
}

fn extract_tar_gz(archive: &[u8], dest: &Path) -> Result<()> {
    let gz = flate2::read::GzDecoder::new(archive);
    let mut tar = tar::Archive::new(gz);

    for entry in tar.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        let path = entry.path().map_err(archive_err)?;
        if path.file_name().is_some_and(|n| n == CLIENT_BINARY_NAME) {
            let mut out = File::create(dest)?;
            std::io::copy(&mut entry, &mut out)?;
            return Ok(());
        }
    }

    Err(missing_member())
}

fn extract_zip(archive: &[u8], dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(archive_err)?;

    for i in 0..zip.len() {
        let mut file = zip.by_index(i).map_err(archive_err)?;
        if file.name().ends_with(CLIENT_BINARY_NAME) {
            let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut buf).map_err(archive_err)?;
            std::fs::write(dest, buf)?;
            return Ok(());
        }
    }

    Err(missing_member())
}

fn archive_err(e: impl std::fmt::Display) -> Error {
    Error::DownloadFailed(format!("corrupt release archive: {e}"))
}

fn missing_member() -> Error {
    Error::DownloadFailed(format!("release archive does not contain {CLIENT_BINARY_NAME}"))
}
