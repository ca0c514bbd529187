//! The install pipeline: resolve, fetch, verify, extract, place.
//!
//! All network and unpack work happens in a scratch directory; the
//! install directory is only touched by the final rename, so a failed
//! run never leaves a partial binary behind.

use crate::config::{resolve_settings, Settings};
use crate::download::{download_file, extract_archive, find_binary};
use crate::error::InstallError;
use crate::manifest::{load_manifest, ReleaseEntry};
use crate::platform::{detect_host, resolve_release};
use crate::verify::verify_checksum;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Install the release matching the current host from a manifest.
///
/// Returns the path of the installed binary.
pub async fn run_install(
    manifest_path: &Path,
    flag_install_dir: Option<PathBuf>,
) -> Result<PathBuf, InstallError> {
    let manifest = load_manifest(manifest_path)?;
    let host = detect_host();
    let entry = resolve_release(&manifest, &host)?;
    let settings = resolve_settings(flag_install_dir)?;

    tracing::info!(
        "Installing {} {} for {}/{}...",
        manifest.name,
        manifest.version,
        entry.os,
        entry.arch
    );

    let installed = fetch_and_place(entry, &settings).await?;

    tracing::info!(
        "Successfully installed {} {} to {}",
        manifest.name,
        manifest.version,
        installed.display()
    );
    Ok(installed)
}

async fn fetch_and_place(
    entry: &ReleaseEntry,
    settings: &Settings,
) -> Result<PathBuf, InstallError> {
    let scratch_err = |reason: String| InstallError::Install {
        binary: entry.binary.clone(),
        dir: settings.install_dir.display().to_string(),
        reason,
    };

    fs::create_dir_all(&settings.install_dir)
        .map_err(|e| scratch_err(format!("failed to create install directory: {}", e)))?;

    let scratch = TempDir::new()
        .map_err(|e| scratch_err(format!("failed to create scratch directory: {}", e)))?;

    let archive_name = archive_filename(&entry.url);
    let archive_path = scratch.path().join(&archive_name);

    download_file(&entry.url, &archive_path, settings.timeout_secs).await?;
    verify_checksum(&archive_path, &entry.sha256, &entry.url)?;

    let unpack_dir = scratch.path().join("unpacked");
    fs::create_dir_all(&unpack_dir)
        .map_err(|e| scratch_err(format!("failed to create scratch directory: {}", e)))?;
    extract_archive(&archive_path, &unpack_dir)?;

    let binary_src =
        find_binary(&unpack_dir, &entry.binary).ok_or_else(|| InstallError::Extraction {
            archive: archive_name.clone(),
            reason: format!("binary '{}' not found in archive", entry.binary),
        })?;

    place_binary(&binary_src, &settings.install_dir, &entry.binary)
}

/// Move the binary into the install directory.
///
/// The file is staged next to its destination first so the final step
/// is a same-filesystem rename, which replaces any previous version in
/// one step.
fn place_binary(src: &Path, install_dir: &Path, binary: &str) -> Result<PathBuf, InstallError> {
    let err = |reason: String| InstallError::Install {
        binary: binary.to_string(),
        dir: install_dir.display().to_string(),
        reason,
    };

    let stage = TempDir::new_in(install_dir)
        .map_err(|e| err(format!("failed to create staging directory: {}", e)))?;
    let staged = stage.path().join(binary);
    fs::copy(src, &staged).map_err(|e| err(format!("failed to stage binary: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&staged)
            .map_err(|e| err(format!("failed to read staged binary: {}", e)))?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&staged, perms)
            .map_err(|e| err(format!("failed to mark binary executable: {}", e)))?;
    }

    let target = install_dir.join(binary);

    // rename cannot replace an existing file on Windows
    #[cfg(not(unix))]
    if target.exists() {
        fs::remove_file(&target)
            .map_err(|e| err(format!("failed to replace existing binary: {}", e)))?;
    }

    fs::rename(&staged, &target).map_err(|e| err(format!("failed to move binary: {}", e)))?;
    Ok(target)
}

/// Last path segment of a release URL, without any query string.
fn archive_filename(url: &str) -> String {
    let name = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or("");
    if name.is_empty() {
        "download".to_string()
    } else {
        name.to_string()
    }
}
