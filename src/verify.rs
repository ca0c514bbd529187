//! Checksum verification of downloaded archives.
//!
//! Verification sits between fetch and extract; an archive whose
//! digest does not match its manifest entry is never unpacked.

use crate::error::InstallError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// Reads in fixed-size chunks so archives never have to fit in memory.
pub fn compute_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Check a downloaded archive against its expected digest.
///
/// Comparison is case-insensitive; manifests may carry either hex
/// case. `url` only labels the error.
pub fn verify_checksum(path: &Path, expected: &str, url: &str) -> Result<(), InstallError> {
    let actual = compute_sha256(path).map_err(|e| InstallError::Install {
        binary: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        dir: path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        reason: format!("failed to read downloaded file: {}", e),
    })?;

    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!("Checksum verified for {}", url);
        Ok(())
    } else {
        Err(InstallError::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_lowercase(),
            actual,
        })
    }
}
