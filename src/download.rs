//! Downloading and unpacking release archives.

use crate::error::InstallError;
use anyhow::Result;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive;
use walkdir::WalkDir;

/// Total attempts for a download, including the first.
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 1000;

/// Fetch `url` into `local_path`, retrying transient failures.
///
/// Retries use linear backoff (attempt number times the base delay).
/// Permanent failures such as 404s or certificate errors fail
/// immediately; the file at `local_path` is truncated on each attempt.
pub async fn download_file(
    url: &str,
    local_path: &Path,
    timeout_secs: u64,
) -> Result<(), InstallError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| InstallError::Download {
            url: url.to_string(),
            reason: format!("failed to build HTTP client: {}", e),
            permanent: true,
        })?;

    let mut last_reason = String::new();
    for attempt in 1..=MAX_RETRIES {
        match try_download(&client, url, local_path).await {
            Ok(()) => return Ok(()),
            Err(e @ InstallError::Download { permanent: true, .. }) => return Err(e),
            Err(InstallError::Download { reason, .. }) => {
                last_reason = reason;
                if attempt < MAX_RETRIES {
                    let delay = Duration::from_millis(RETRY_DELAY_MS * attempt as u64);
                    tracing::warn!(
                        "Download attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        MAX_RETRIES,
                        last_reason,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
            Err(other) => return Err(other),
        }
    }

    Err(InstallError::Download {
        url: url.to_string(),
        reason: format!("{} (after {} attempts)", last_reason, MAX_RETRIES),
        permanent: false,
    })
}

async fn try_download(
    client: &reqwest::Client,
    url: &str,
    local_path: &Path,
) -> Result<(), InstallError> {
    tracing::info!("Downloading {}...", file_label(local_path));

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_request_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(InstallError::Download {
            url: url.to_string(),
            reason: format!("server returned {}", status),
            permanent: !is_retryable_status(status),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("#>-")
    );
    pb.set_message(format!("Downloading {}", file_label(local_path)));

    let mut file = fs::File::create(local_path).map_err(|e| InstallError::Download {
        url: url.to_string(),
        reason: format!("failed to create {}: {}", local_path.display(), e),
        permanent: true,
    })?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| classify_request_error(url, &e))?;
        file.write_all(&chunk).map_err(|e| InstallError::Download {
            url: url.to_string(),
            reason: format!("failed to write {}: {}", local_path.display(), e),
            permanent: true,
        })?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    pb.finish_with_message("Download complete");
    Ok(())
}

/// 5xx and 429 are worth retrying; other HTTP statuses are not.
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

/// Certificate problems will not fix themselves on retry.
fn is_permanent_reason(reason: &str) -> bool {
    let lowered = reason.to_lowercase();
    lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl")
}

fn classify_request_error(url: &str, err: &reqwest::Error) -> InstallError {
    let reason = err.to_string();
    let permanent = is_permanent_reason(&reason);
    InstallError::Download {
        url: url.to_string(),
        reason,
        permanent,
    }
}

/// Unpack a downloaded archive into `extract_dir`.
///
/// The format is chosen from the archive filename; tar.gz, tgz,
/// tar.xz and zip are supported.
pub fn extract_archive(archive_path: &Path, extract_dir: &Path) -> Result<(), InstallError> {
    tracing::info!("Extracting {}...", file_label(archive_path));

    let name = archive_path.to_string_lossy();
    let result = if name.ends_with(".zip") {
        extract_zip(archive_path, extract_dir)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive_path, extract_dir)
    } else if name.ends_with(".tar.xz") {
        extract_tar_xz(archive_path, extract_dir)
    } else {
        return Err(InstallError::Extraction {
            archive: file_label(archive_path),
            reason: "unsupported archive format".to_string(),
        });
    };

    result.map_err(|e| InstallError::Extraction {
        archive: file_label(archive_path),
        reason: e.to_string(),
    })
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        // Entry names can carry ".." or absolute paths; never let them
        // write outside the extraction directory
        let outpath = match file.enclosed_name() {
            Some(path) => extract_dir.join(path),
            None => {
                tracing::warn!("Skipping malicious path in zip: {}", file.name());
                continue;
            }
        };

        if file.name().ends_with('/') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    archive.unpack(extract_dir)?;

    Ok(())
}

fn extract_tar_xz(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let decoder = xz2::read::XzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    archive.unpack(extract_dir)?;

    Ok(())
}

/// Locate the named binary under the extraction directory.
///
/// Release archives sometimes nest the binary under a versioned
/// directory, so the whole tree is searched; when the name appears
/// more than once the shallowest match wins.
pub fn find_binary(extract_dir: &Path, binary: &str) -> Option<PathBuf> {
    let mut best: Option<(usize, PathBuf)> = None;

    for entry in WalkDir::new(extract_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.file_name() != Some(std::ffi::OsStr::new(binary)) {
            continue;
        }
        match &best {
            Some((depth, _)) if *depth <= entry.depth() => {}
            _ => best = Some((entry.depth(), path.to_path_buf())),
        }
    }

    if let Some((_, path)) = &best {
        tracing::debug!("Found binary at {}", path.display());
    }
    best.map(|(_, path)| path)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
