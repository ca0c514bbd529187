//! Host platform detection and release entry resolution.
//!
//! Resolution is an exact lookup against the manifest's release table:
//! no fuzzy matching, no fallback entry. A host the table does not name
//! fails immediately with `UnsupportedPlatform`.

use crate::error::InstallError;
use crate::manifest::{Manifest, ReleaseEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
    pub bits: u32,
}

/// Detect the running machine's platform.
///
/// Architecture names are normalized to the manifest vocabulary
/// (`aarch64` is spelled `arm64` there); unknown values pass through
/// unchanged so the error message names what was actually detected.
pub fn detect_host() -> HostPlatform {
    let os = std::env::consts::OS.to_string();
    let arch = match std::env::consts::ARCH {
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    };

    HostPlatform {
        os,
        arch,
        bits: usize::BITS,
    }
}

/// Find the single release entry matching the host.
///
/// An entry that pins `bits` only matches a host with that pointer
/// width; entries without it match any width. Manifest validation
/// guarantees at most one entry can match, so the first hit is the only
/// hit.
pub fn resolve_release<'a>(
    manifest: &'a Manifest,
    host: &HostPlatform,
) -> Result<&'a ReleaseEntry, InstallError> {
    tracing::debug!(
        "Resolving release for {}/{} ({}-bit) among {} entries",
        host.os,
        host.arch,
        host.bits,
        manifest.releases.len()
    );

    manifest
        .releases
        .iter()
        .find(|entry| {
            entry.os.as_str() == host.os
                && entry.arch.as_str() == host.arch
                && entry.bits.map_or(true, |b| b == host.bits)
        })
        .ok_or_else(|| InstallError::UnsupportedPlatform {
            os: host.os.clone(),
            arch: host.arch.clone(),
            bits: host.bits,
        })
}
