//! Error taxonomy for the install pipeline.
//!
//! Every failure class carries enough context to diagnose without a
//! debugger (platform attempted, URL attempted, expected vs computed
//! digest) and maps to its own process exit code so scripts can tell an
//! unsupported platform apart from a checksum mismatch without parsing
//! stderr.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("no release entry matches this platform: {os}/{arch} ({bits}-bit)")]
    UnsupportedPlatform { os: String, arch: String, bits: u32 },

    #[error("download failed for {url}: {reason}")]
    Download {
        url: String,
        reason: String,
        /// Permanent failures (404, TLS, other 4xx) are never retried.
        permanent: bool,
    },

    #[error("checksum mismatch for {url}: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("failed to extract {archive}: {reason}")]
    Extraction { archive: String, reason: String },

    #[error("failed to install {binary} into {dir}: {reason}")]
    Install {
        binary: String,
        dir: String,
        reason: String,
    },

    #[error("malformed manifest {path}: {reason}")]
    Manifest { path: String, reason: String },
}

impl InstallError {
    /// Process exit code for this failure class.
    ///
    /// Code 2 is left to clap's usage errors; relget's own codes start
    /// at 3.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::UnsupportedPlatform { .. } => 3,
            InstallError::Download { .. } => 4,
            InstallError::ChecksumMismatch { .. } => 5,
            InstallError::Extraction { .. } => 6,
            InstallError::Install { .. } => 7,
            InstallError::Manifest { .. } => 8,
        }
    }
}
