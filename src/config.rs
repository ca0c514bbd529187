//! Install-target and fetch settings.
//!
//! The install directory is resolved once per invocation with the
//! precedence flag > environment > default; nothing is persisted
//! between invocations.

use crate::error::InstallError;
use std::path::PathBuf;

pub const INSTALL_DIR_ENV: &str = "RELGET_INSTALL_DIR";
pub const TIMEOUT_ENV: &str = "RELGET_TIMEOUT_SECS";

/// Overall timeout for a single download request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Settings {
    pub install_dir: PathBuf,
    pub timeout_secs: u64,
}

/// Resolve the effective settings for this invocation.
///
/// `flag_install_dir` is the `--install-dir` value when given;
/// `RELGET_INSTALL_DIR` overrides the default `~/.local/bin` otherwise.
pub fn resolve_settings(flag_install_dir: Option<PathBuf>) -> Result<Settings, InstallError> {
    let env_dir = std::env::var(INSTALL_DIR_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);
    let env_timeout = std::env::var(TIMEOUT_ENV).ok();

    let settings = build_settings(flag_install_dir, env_dir, env_timeout)?;
    tracing::debug!(
        "Install directory: {} (timeout {}s)",
        settings.install_dir.display(),
        settings.timeout_secs
    );
    Ok(settings)
}

fn build_settings(
    flag_dir: Option<PathBuf>,
    env_dir: Option<PathBuf>,
    env_timeout: Option<String>,
) -> Result<Settings, InstallError> {
    let install_dir = match flag_dir.or(env_dir) {
        Some(dir) => dir,
        None => default_install_dir()?,
    };

    let timeout_secs = match env_timeout {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!(
                    "Ignoring invalid {} value '{}', using {}s",
                    TIMEOUT_ENV,
                    raw,
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }
        },
        None => DEFAULT_TIMEOUT_SECS,
    };

    Ok(Settings {
        install_dir,
        timeout_secs,
    })
}

/// `~/.local/bin`, the conventional per-user directory on the search
/// path.
fn default_install_dir() -> Result<PathBuf, InstallError> {
    dirs::home_dir()
        .map(|home| home.join(".local").join("bin"))
        .ok_or_else(|| InstallError::Install {
            binary: "binary".to_string(),
            dir: "~/.local/bin".to_string(),
            reason: "could not determine home directory".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_env() {
        let settings = build_settings(
            Some(PathBuf::from("/opt/bin")),
            Some(PathBuf::from("/env/bin")),
            None,
        )
        .unwrap();
        assert_eq!(settings.install_dir, PathBuf::from("/opt/bin"));
    }

    #[test]
    fn test_env_wins_over_default() {
        let settings = build_settings(None, Some(PathBuf::from("/env/bin")), None).unwrap();
        assert_eq!(settings.install_dir, PathBuf::from("/env/bin"));
    }

    #[test]
    fn test_default_install_dir_is_local_bin() {
        let settings = build_settings(None, None, None).unwrap();
        assert!(settings.install_dir.ends_with(".local/bin"));
    }

    #[test]
    fn test_timeout_parsing() {
        let settings = build_settings(None, None, Some("42".to_string())).unwrap();
        assert_eq!(settings.timeout_secs, 42);

        // Garbage and zero fall back to the default
        let settings = build_settings(None, None, Some("soon".to_string())).unwrap();
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
        let settings = build_settings(None, None, Some("0".to_string())).unwrap();
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
