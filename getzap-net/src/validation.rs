// getzap-net/src/validation.rs
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use getzap_common::error::{GetZapError, Result};
use sha2::{Digest, Sha256};
use url::Url;

/// Parses a URL and applies the transport policy: HTTPS always, plain HTTP
/// only when explicitly allowed.
pub fn validate_url(url_str: &str, allow_http: bool) -> Result<Url> {
    let url = Url::parse(url_str).map_err(|e| {
        GetZapError::ValidationError(format!("Failed to parse URL '{url_str}': {e}"))
    })?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if allow_http => {
            tracing::warn!("Using unencrypted HTTP for {}", url_str);
            Ok(url)
        }
        "http" => Err(GetZapError::InsecureProtocol(url_str.to_string())),
        other => Err(GetZapError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': Must be https, but got '{other}'"
        ))),
    }
}

pub fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let bytes_copied = io::copy(&mut file, &mut hasher)?;
    let actual = hex::encode(hasher.finalize());
    tracing::debug!(
        "Calculated SHA256 for {}: {} ({} bytes read)",
        path.display(),
        actual,
        bytes_copied
    );
    Ok(actual)
}

pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    tracing::debug!("Verifying checksum for: {}", path.display());
    let actual = compute_sha256(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(GetZapError::ChecksumError(format!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        )))
    }
}

/// Joins a server-supplied relative path under `root`, refusing anything
/// that would land outside it.
pub fn safe_join(root: &Path, relative: &str) -> Result<PathBuf> {
    let relative = relative.trim_start_matches('/');
    let candidate = Path::new(relative);
    if relative.is_empty()
        || !candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(GetZapError::ValidationError(format!(
            "Refusing to write outside of {}: '{}'",
            root.display(),
            relative
        )));
    }
    Ok(root.join(candidate))
}
