// getzap-net/src/artifactory.rs
//! Cache tier backed by the Artifactory REST API (storage listing plus plain
//! GET/PUT/DELETE on repository paths).
use std::fs::File;
use std::path::{Path, PathBuf};

use getzap_common::config::ArtifactoryConfig;
use getzap_common::error::{GetZapError, Result};
use getzap_common::model::{RepositoryPattern, TransferOptions};
use glob::Pattern;
use reqwest::blocking::{Body, Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::http::{client_builder, network_error, status_error};
use crate::tier::CacheTier;
use crate::transfer::TransferEngine;
use crate::validation::{compute_sha256, safe_join, validate_url, verify_checksum};

const CHECKSUM_SHA256_HEADER: &str = "X-Checksum-Sha256";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    /// Relative to the listed folder, with a leading `/`.
    uri: String,
    #[serde(default)]
    folder: bool,
    #[serde(default)]
    size: u64,
}

pub struct ArtifactoryClient {
    config: ArtifactoryConfig,
    client: Client,
    transfer: TransferEngine,
    allow_http: bool,
}

impl ArtifactoryClient {
    /// Credentials are checked when an operation runs, so a client for an
    /// unconfigured cache can be built and left unused.
    pub fn new(config: ArtifactoryConfig, options: &TransferOptions) -> Result<Self> {
        let client = client_builder(options)?
            .build()
            .map_err(|e| GetZapError::Config(format!("Failed to build HTTP client: {e}")))?;
        let transfer = TransferEngine::new(options.clone())?;
        Ok(Self {
            config: ArtifactoryConfig {
                url: config.url.trim_end_matches('/').to_string(),
                ..config
            },
            client,
            transfer,
            allow_http: options.allow_insecure_http,
        })
    }

    pub fn config(&self) -> &ArtifactoryConfig {
        &self.config
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.config.is_valid() {
            Ok(())
        } else {
            Err(GetZapError::InvalidCredentials)
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.user, Some(&self.config.api_key))
    }

    /// Prefixes the configured base folder to a pattern-relative path.
    fn remote_path(&self, relative: &str) -> String {
        let base = self.config.path.trim_matches('/');
        let relative = relative.trim_matches('/');
        match (base.is_empty(), relative.is_empty()) {
            (true, _) => relative.to_string(),
            (false, true) => base.to_string(),
            (false, false) => format!("{base}/{relative}"),
        }
    }

    fn artifact_url(&self, relative: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.url,
            self.config.repo,
            self.remote_path(relative)
        )
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<reqwest::blocking::Response> {
        validate_url(url, self.allow_http)?;
        self.authorize(request)
            .send()
            .map_err(|e| network_error(url, e))
    }

    /// Pattern-relative paths of every file under `folder`, deep.
    fn list_files(&self, folder: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/api/storage/{}/{}?list&deep=1&listFolders=0",
            self.config.url,
            self.config.repo,
            self.remote_path(folder)
        );
        debug!("Listing Artifactory folder: {}", url);
        let response = self.send(self.client.get(&url), &url)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Folder '{}' does not exist in {}", folder, self.config.repo);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error(&response, &url));
        }
        let listing: FileList = response.json()?;
        let folder = folder.trim_matches('/');
        Ok(listing
            .files
            .into_iter()
            .filter(|entry| !entry.folder)
            .map(|entry| {
                debug!("Found {} ({} bytes)", entry.uri, entry.size);
                let name = entry.uri.trim_start_matches('/');
                if folder.is_empty() {
                    name.to_string()
                } else {
                    format!("{folder}/{name}")
                }
            })
            .collect())
    }

    fn matching_files(&self, pattern: &RepositoryPattern) -> Result<Vec<String>> {
        let matcher = Pattern::new(pattern.as_str()).map_err(|e| {
            GetZapError::ValidationError(format!("Invalid pattern '{pattern}': {e}"))
        })?;
        let files = self.list_files(&pattern.literal_prefix())?;
        Ok(files
            .into_iter()
            .filter(|path| matcher.matches(path))
            .collect())
    }

    fn download_one(&self, relative: &str, local_root: &Path) -> Result<PathBuf> {
        let destination = safe_join(local_root, relative)?;
        let url = self.artifact_url(relative);
        let downloaded = self
            .transfer
            .download_with(&url, &destination, |request| self.authorize(request))?;
        if let Some(expected) = &downloaded.announced_sha256 {
            verify_checksum(&destination, expected)?;
        }
        info!(
            "Downloaded {} ({} bytes) to {}",
            relative,
            downloaded.bytes,
            destination.display()
        );
        Ok(destination)
    }

    fn upload_one(&self, folder: &str, file: &Path) -> Result<()> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                GetZapError::ValidationError(format!("Not a file path: {}", file.display()))
            })?;
        let relative = if folder.is_empty() {
            name
        } else {
            format!("{folder}/{name}")
        };
        let url = self.artifact_url(&relative);
        let checksum = compute_sha256(file)?;
        let handle = File::open(file)?;
        let len = handle.metadata()?.len();
        debug!("Uploading {} ({} bytes) to {}", file.display(), len, url);

        let request = self
            .client
            .put(&url)
            .header(CHECKSUM_SHA256_HEADER, checksum)
            .body(Body::sized(handle, len));
        let response = self.send(request, &url)?;
        if !response.status().is_success() {
            return Err(status_error(&response, &url));
        }
        info!("Uploaded {} to {}", file.display(), relative);
        Ok(())
    }

    /// Returns false when the path did not exist.
    fn delete_one(&self, relative: &str) -> Result<bool> {
        let url = self.artifact_url(relative);
        let response = self.send(self.client.delete(&url), &url)?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("Nothing to delete at {}", relative);
                Ok(false)
            }
            status if status.is_success() => {
                info!("Deleted {}", relative);
                Ok(true)
            }
            _ => Err(status_error(&response, &url)),
        }
    }
}

impl CacheTier for ArtifactoryClient {
    fn download(&self, pattern: &RepositoryPattern, local_root: &Path) -> Result<Vec<PathBuf>> {
        self.ensure_credentials()?;
        let files = if pattern.has_wildcards() {
            self.matching_files(pattern)?
        } else {
            vec![pattern.as_str().to_string()]
        };
        if files.is_empty() {
            info!("No artifacts matching '{}' in {}", pattern, self.describe());
            return Ok(Vec::new());
        }

        let mut written = Vec::with_capacity(files.len());
        let mut failed = 0;
        let mut last_error = None;
        for relative in &files {
            match self.download_one(relative, local_root) {
                Ok(path) => written.push(path),
                Err(GetZapError::HttpStatus { status: 404, .. }) if !pattern.has_wildcards() => {
                    debug!("Artifact '{}' not present in cache", relative);
                    return Ok(Vec::new());
                }
                Err(e) => {
                    error!("Failed to download {}: {}", relative, e);
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            None => Ok(written),
            Some(e) if written.is_empty() => Err(e),
            Some(_) => Err(GetZapError::PartialDownload {
                succeeded: written.len(),
                failed,
            }),
        }
    }

    fn upload(&self, pattern: &RepositoryPattern, files: &[PathBuf]) -> Result<usize> {
        self.ensure_credentials()?;
        let folder = pattern.literal_prefix();
        let mut succeeded = 0;
        let mut failed = 0;
        for file in files {
            match self.upload_one(&folder, file) {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    warn!("Failed to upload {}: {}", file.display(), e);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(GetZapError::PartialUpload { succeeded, failed });
        }
        Ok(succeeded)
    }

    fn delete(&self, pattern: &RepositoryPattern) -> Result<usize> {
        self.ensure_credentials()?;
        if !pattern.has_wildcards() {
            return self
                .delete_one(pattern.as_str())
                .map(usize::from);
        }
        let mut deleted = 0;
        for relative in self.matching_files(pattern)? {
            if self.delete_one(&relative)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn ping(&self) -> Result<()> {
        self.ensure_credentials()?;
        let url = format!("{}/api/system/ping", self.config.url);
        let response = self.send(self.client.get(&url), &url)?;
        if !response.status().is_success() {
            return Err(status_error(&response, &url));
        }
        debug!("Artifactory at {} answered ping", self.config.url);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.config.url, self.config.repo)
    }
}
