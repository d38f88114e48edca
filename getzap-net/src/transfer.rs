// getzap-net/src/transfer.rs
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use getzap_common::error::{GetZapError, Result};
use getzap_common::model::{TransferOptions, TransferRequest, TransferSource};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::blocking::{Client, RequestBuilder};
use tracing::{debug, info};

use crate::http::{client_builder, network_error};
use crate::validation::validate_url;

/// Number of progress steps a transfer of known length is split into.
pub const PROGRESS_STEPS: u64 = 100;
const CHECKSUM_HEADER: &str = "x-checksum-sha256";

/// Result of a URL download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub bytes: u64,
    /// SHA256 announced by the server, if any.
    pub announced_sha256: Option<String>,
}

/// Materializes bytes from a URL or an open stream into a local file.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    client: Client,
    options: TransferOptions,
}

impl TransferEngine {
    pub fn new(options: TransferOptions) -> Result<Self> {
        let client = client_builder(&options)?
            .build()
            .map_err(|e| GetZapError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    pub fn transfer(&self, request: TransferRequest) -> Result<u64> {
        match request.source {
            TransferSource::Url(url) => self.download_url(&url, &request.destination),
            TransferSource::Stream(reader) => copy_stream(reader, &request.destination),
        }
    }

    pub fn download_url(&self, url: &str, destination: &Path) -> Result<u64> {
        self.download_with(url, destination, |request| request)
            .map(|downloaded| downloaded.bytes)
    }

    /// Downloads `url` into `destination`. `customize` may add headers or
    /// credentials to the request before it is sent.
    pub fn download_with<F>(&self, url: &str, destination: &Path, customize: F) -> Result<Downloaded>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        // Policy is checked before any byte is requested.
        validate_url(url, self.options.allow_insecure_http)?;

        let response = customize(self.client.get(url))
            .send()
            .map_err(|e| network_error(url, e))?;
        let status = response.status();
        debug!("Received HTTP status: {} for {}", status, url);
        if !status.is_success() {
            return Err(GetZapError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let announced_sha256 = response
            .headers()
            .get(CHECKSUM_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length().filter(|len| *len > 0);
        let file_name = destination
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        match content_length {
            Some(len) => info!("Downloading {} bytes to {} ...", len, file_name),
            None => info!("Downloading {} (size unknown) ...", file_name),
        }

        let mut output = create_destination(destination)?;
        let progress = TransferProgress::new(self.options.show_progress, content_length);
        let mut body = response;
        let bytes = copy_chunked(&mut body, &mut output, content_length, |_, total| {
            progress.update(total)
        })
        .map_err(|e| {
            GetZapError::Network(format!(
                "Failed to write download stream to {}: {}",
                destination.display(),
                e
            ))
        })?;
        progress.finish(bytes);

        Ok(Downloaded {
            bytes,
            announced_sha256,
        })
    }
}

/// Copies an already-open stream into `destination`, truncating it first.
pub fn copy_stream(mut reader: Box<dyn Read + Send>, destination: &Path) -> Result<u64> {
    let mut output = create_destination(destination)?;
    let bytes = io::copy(&mut reader, &mut output)?;
    output.flush()?;
    debug!("Copied {} bytes to {}", bytes, destination.display());
    Ok(bytes)
}

fn create_destination(destination: &Path) -> Result<File> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            GetZapError::Io(std::sync::Arc::new(io::Error::new(
                e.kind(),
                format!("Failed to create directory {}: {}", parent.display(), e),
            )))
        })?;
    }
    File::create(destination).map_err(|e| {
        GetZapError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!("Failed to create file {}: {}", destination.display(), e),
        )))
    })
}

fn chunk_size(content_length: Option<u64>) -> Option<u64> {
    match content_length {
        Some(len) if len > PROGRESS_STEPS => Some(len / PROGRESS_STEPS),
        Some(len) if len > 0 => Some(len),
        _ => None,
    }
}

/// Copies `reader` to `writer` in chunks of `L/100` bytes (the whole body when
/// `L <= 100`), calling `on_chunk(chunk_len, total_written)` after each chunk.
/// With an unknown length the body is copied in one unbounded pass.
pub fn copy_chunked<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    content_length: Option<u64>,
    mut on_chunk: F,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    F: FnMut(u64, u64),
{
    let chunk = chunk_size(content_length);
    let mut total = 0u64;
    loop {
        let written = match chunk {
            Some(size) => io::copy(&mut (&mut *reader).take(size), writer)?,
            None => io::copy(reader, writer)?,
        };
        if written == 0 {
            break;
        }
        total += written;
        on_chunk(written, total);
        if chunk.is_none() {
            break;
        }
    }
    writer.flush()?;
    Ok(total)
}

struct TransferProgress {
    bar: ProgressBar,
    total: Option<u64>,
}

impl TransferProgress {
    fn new(show: bool, total: Option<u64>) -> Self {
        let bar = if show {
            ProgressBar::with_draw_target(total, ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar, total }
    }

    fn line(&self, written: u64) -> String {
        match self.total {
            Some(len) if len > 0 => format!(
                "{}%: Downloaded {} out of {} bytes",
                written.saturating_mul(100) / len,
                written,
                len
            ),
            _ => format!("Downloaded {written} bytes"),
        }
    }

    fn update(&self, written: u64) {
        self.bar.set_position(written);
        self.bar.set_message(format!("{}...", self.line(written)));
    }

    fn finish(&self, written: u64) {
        let line = format!("{}. Done!", self.line(written));
        if self.bar.is_hidden() {
            info!("{}", line);
        } else {
            self.bar.finish_with_message(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use getzap_common::model::TransferOptions;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn quiet_options() -> TransferOptions {
        TransferOptions {
            allow_insecure_http: true,
            show_progress: false,
            ..TransferOptions::default()
        }
    }

    #[test]
    fn chunked_copy_uses_one_percent_chunks() {
        let body = vec![7u8; 250];
        let mut chunks = Vec::new();
        let mut out: Vec<u8> = Vec::new();
        let total = copy_chunked(&mut Cursor::new(&body), &mut out, Some(250), |len, _| {
            chunks.push(len)
        })
        .unwrap();

        assert_eq!(total, 250);
        assert_eq!(out, body);
        // 250 / 100 = 2 bytes per chunk.
        assert!(chunks.iter().all(|len| *len == 2));
        assert_eq!(chunks.len(), 125);
        assert_eq!(chunks.iter().sum::<u64>(), 250);
    }

    #[test]
    fn chunked_copy_ends_with_a_partial_chunk() {
        let body = vec![1u8; 1055];
        let mut totals = Vec::new();
        let total = copy_chunked(
            &mut Cursor::new(&body),
            &mut Vec::<u8>::new(),
            Some(1055),
            |len, running| totals.push((len, running)),
        )
        .unwrap();

        assert_eq!(total, 1055);
        // 105 chunks of 10 bytes, then the 5 byte remainder.
        assert_eq!(totals.len(), 106);
        assert_eq!(totals[104], (10, 1050));
        assert_eq!(totals.last(), Some(&(5, 1055)));
    }

    #[test]
    fn small_bodies_copy_in_one_chunk() {
        let mut calls = 0;
        let total = copy_chunked(
            &mut Cursor::new(b"tiny body"),
            &mut Vec::<u8>::new(),
            Some(9),
            |_, _| calls += 1,
        )
        .unwrap();
        assert_eq!(total, 9);
        assert_eq!(calls, 1);
    }

    #[test]
    fn unknown_length_copies_in_a_single_unbounded_pass() {
        let body = vec![3u8; 4096];
        let mut calls = Vec::new();
        let total = copy_chunked(&mut Cursor::new(&body), &mut Vec::<u8>::new(), None, |len, _| {
            calls.push(len)
        })
        .unwrap();
        assert_eq!(total, 4096);
        assert_eq!(calls, vec![4096]);
    }

    #[test]
    fn progress_line_handles_unknown_length() {
        let progress = TransferProgress::new(false, None);
        assert_eq!(progress.line(10), "Downloaded 10 bytes");
        let progress = TransferProgress::new(false, Some(200));
        assert_eq!(progress.line(50), "25%: Downloaded 50 out of 200 bytes");
    }

    #[test]
    fn plain_http_is_refused_without_touching_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("zap-linux-x64.zip");
        let engine = TransferEngine::new(TransferOptions {
            show_progress: false,
            ..TransferOptions::default()
        })
        .unwrap();

        let err = engine
            .download_url("http://127.0.0.1:9/zap-linux-x64.zip", &dest)
            .unwrap_err();

        assert!(matches!(err, GetZapError::InsecureProtocol(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn stream_copy_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("v1").join("asset.bin");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, b"a much longer previous content").unwrap();

        let written = copy_stream(Box::new(Cursor::new(b"new".to_vec())), &dest).unwrap();

        assert_eq!(written, 3);
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    fn download(url: String) -> (Result<u64>, Option<Vec<u8>>) {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("asset.zip");
        let engine = TransferEngine::new(quiet_options()).unwrap();
        let result = engine.transfer(TransferRequest::from_url(url, &dest));
        (result, fs::read(&dest).ok())
    }

    #[tokio::test]
    async fn downloads_body_over_http_when_allowed() {
        let body = vec![42u8; 250];
        let server = serve(
            "/asset.zip",
            ResponseTemplate::new(200).set_body_bytes(body.clone()),
        )
        .await;

        let url = format!("{}/asset.zip", server.uri());
        let (written, contents) = tokio::task::spawn_blocking(move || download(url))
            .await
            .unwrap();

        assert_eq!(written.unwrap(), 250);
        assert_eq!(contents, Some(body));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = serve("/missing.zip", ResponseTemplate::new(404)).await;

        let url = format!("{}/missing.zip", server.uri());
        let (result, contents) = tokio::task::spawn_blocking(move || download(url))
            .await
            .unwrap();

        assert!(matches!(result, Err(GetZapError::HttpStatus { status: 404, .. })));
        assert_eq!(contents, None);
    }

    #[tokio::test]
    async fn rejected_transfers_keep_the_http_status() {
        // Asset URLs are presigned; a 401 or 403 there is not a credential problem.
        let server = serve("/asset.zip", ResponseTemplate::new(401)).await;

        let url = format!("{}/asset.zip", server.uri());
        let (result, _) = tokio::task::spawn_blocking(move || download(url))
            .await
            .unwrap();

        assert!(matches!(result, Err(GetZapError::HttpStatus { status: 401, .. })));
    }

    #[tokio::test]
    async fn announced_checksum_is_returned() {
        let server = serve(
            "/asset.zip",
            ResponseTemplate::new(200)
                .set_body_bytes(b"zap".to_vec())
                .insert_header("X-Checksum-Sha256", "abc123"),
        )
        .await;

        let url = format!("{}/asset.zip", server.uri());
        let downloaded = tokio::task::spawn_blocking(move || {
            let dir = tempfile::tempdir().unwrap();
            let engine = TransferEngine::new(quiet_options()).unwrap();
            engine.download_with(&url, &dir.path().join("asset.zip"), |request| request)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(downloaded.bytes, 3);
        assert_eq!(downloaded.announced_sha256.as_deref(), Some("abc123"));
    }
}
