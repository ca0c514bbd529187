//! Release manifest loading and validation.
//!
//! A manifest is the structured-data equivalent of a package formula: a
//! small metadata header plus one release entry per supported
//! (os, arch) combination, each carrying a download URL, a SHA-256
//! digest, and the name of the binary inside the archive. Manifests are
//! read from YAML or JSON files, dispatched on the file extension.

use crate::error::InstallError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Hex length of a SHA-256 digest. Anything else is a malformed entry,
/// never truncated or padded.
const SHA256_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Os {
    #[serde(rename = "macos")]
    Macos,
    #[serde(rename = "linux")]
    Linux,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Macos => "macos",
            Os::Linux => "linux",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Arch {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One installable release for a specific platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub os: Os,
    pub arch: Arch,
    /// Required pointer width. Entries without it match any width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<u32>,
    pub url: String,
    pub sha256: String,
    pub binary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub releases: Vec<ReleaseEntry>,
}

/// Load and validate a manifest file.
///
/// `.yaml`/`.yml` and `.json` are accepted; the extension picks the
/// parser. Every invariant violation is reported as a malformed
/// manifest, including parse failures.
pub fn load_manifest(path: &Path) -> Result<Manifest, InstallError> {
    let malformed = |reason: String| InstallError::Manifest {
        path: path.display().to_string(),
        reason,
    };

    let content =
        fs::read_to_string(path).map_err(|e| malformed(format!("could not read file: {}", e)))?;

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let manifest: Manifest = match ext.as_str() {
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| malformed(format!("invalid YAML: {}", e)))?
        }
        "json" => {
            serde_json::from_str(&content).map_err(|e| malformed(format!("invalid JSON: {}", e)))?
        }
        other => {
            return Err(malformed(format!(
                "unsupported manifest format '.{}' (expected .yaml, .yml or .json)",
                other
            )))
        }
    };

    validate_manifest(&manifest).map_err(malformed)?;
    Ok(manifest)
}

/// Check the manifest invariants: a non-empty release table, well-formed
/// digests, secure download URLs, and no two entries claiming the same
/// platform.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), String> {
    if manifest.releases.is_empty() {
        return Err("manifest has no release entries".to_string());
    }

    let mut seen: HashMap<(Os, Arch), Vec<Option<u32>>> = HashMap::new();

    for (i, entry) in manifest.releases.iter().enumerate() {
        let at = format!("releases[{}] ({}/{})", i, entry.os, entry.arch);

        if !is_valid_sha256(&entry.sha256) {
            return Err(format!(
                "{}: sha256 must be exactly {} hex characters, got {:?} ({} characters)",
                at,
                SHA256_HEX_LEN,
                entry.sha256,
                entry.sha256.len()
            ));
        }

        if !is_secure_url(&entry.url) {
            return Err(format!(
                "{}: url must use https (got {:?})",
                at, entry.url
            ));
        }

        if entry.binary.is_empty() {
            return Err(format!("{}: binary name is empty", at));
        }

        if let Some(bits) = entry.bits {
            if bits != 32 && bits != 64 {
                return Err(format!("{}: bits must be 32 or 64, got {}", at, bits));
            }
        }

        let widths = seen.entry((entry.os, entry.arch)).or_default();
        // Two entries for the same (os, arch) are only allowed when both
        // pin a bit width and the widths differ; anything else makes
        // resolution ambiguous.
        let conflict = widths
            .iter()
            .any(|prev| prev.is_none() || entry.bits.is_none() || *prev == entry.bits);
        if conflict {
            return Err(format!("{}: duplicate platform entry", at));
        }
        widths.push(entry.bits);
    }

    Ok(())
}

/// Exactly 64 ASCII hex characters. Case does not matter here; the
/// digest comparison at verify time is case-insensitive anyway.
pub fn is_valid_sha256(digest: &str) -> bool {
    digest.len() == SHA256_HEX_LEN && digest.chars().all(|c| c.is_ascii_hexdigit())
}

/// Download URLs must use TLS. Plain http is tolerated only for
/// loopback hosts so the pipeline can be exercised against a local
/// fixture server.
pub fn is_secure_url(url: &str) -> bool {
    if url.starts_with("https://") {
        return true;
    }
    if let Some(rest) = url.strip_prefix("http://") {
        let authority = rest.split(['/', '?']).next().unwrap_or("");
        // Strip an optional port; bracketed IPv6 hosts keep their brackets.
        let host = if authority.starts_with('[') {
            match authority.find(']') {
                Some(end) => &authority[..=end],
                None => return false,
            }
        } else {
            authority.rsplit_once(':').map_or(authority, |(h, _)| h)
        };
        return matches!(host, "localhost" | "127.0.0.1" | "[::1]");
    }
    false
}
