// getzap-common/src/model/transfer.rs
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use url::Url;

/// Transport security and display policy for a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    pub skip_cert_check: bool,
    pub proxy_url: Option<Url>,
    pub allow_insecure_http: bool,
    pub show_progress: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            skip_cert_check: false,
            proxy_url: None,
            allow_insecure_http: false,
            show_progress: true,
        }
    }
}

impl TransferOptions {
    pub fn set_proxy(&mut self, proxy: &str) -> crate::Result<()> {
        self.proxy_url = Some(Url::parse(proxy)?);
        Ok(())
    }
}

/// Asset content as served by the origin: either the bytes themselves or a
/// content-delivery URL to fetch them from.
pub enum AssetBody {
    Stream(Box<dyn Read + Send>),
    RedirectUrl(String),
}

impl fmt::Debug for AssetBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetBody::Stream(_) => f.write_str("AssetBody::Stream(..)"),
            AssetBody::RedirectUrl(url) => write!(f, "AssetBody::RedirectUrl({url})"),
        }
    }
}

pub enum TransferSource {
    Url(String),
    Stream(Box<dyn Read + Send>),
}

impl From<AssetBody> for TransferSource {
    fn from(body: AssetBody) -> Self {
        match body {
            AssetBody::Stream(reader) => TransferSource::Stream(reader),
            AssetBody::RedirectUrl(url) => TransferSource::Url(url),
        }
    }
}

impl fmt::Debug for TransferSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferSource::Url(url) => write!(f, "TransferSource::Url({url})"),
            TransferSource::Stream(_) => f.write_str("TransferSource::Stream(..)"),
        }
    }
}

/// A single transfer to perform. Configuration only; no connection is held.
#[derive(Debug)]
pub struct TransferRequest {
    pub source: TransferSource,
    pub destination: PathBuf,
}

impl TransferRequest {
    pub fn new(source: impl Into<TransferSource>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn from_url(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: TransferSource::Url(url.into()),
            destination: destination.into(),
        }
    }
}
