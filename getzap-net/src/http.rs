// getzap-net/src/http.rs
use std::time::Duration;

use getzap_common::error::{GetZapError, Result};
use getzap_common::model::TransferOptions;
use reqwest::blocking::{ClientBuilder, Response};
use reqwest::redirect::Policy;
use reqwest::{Proxy, StatusCode};
use tracing::{debug, warn};

const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;
pub const USER_AGENT_STRING: &str = "get-zap (Rust; +https://github.com/project-chip/zap)";

/// A blocking client builder configured from the transfer policy. Callers add
/// their own headers and redirect policy before building.
pub fn client_builder(options: &TransferOptions) -> Result<ClientBuilder> {
    let mut builder = ClientBuilder::new()
        .user_agent(USER_AGENT_STRING)
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(redirect_policy(options.allow_insecure_http));

    if options.skip_cert_check {
        warn!("TLS certificate verification is disabled.");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder = match &options.proxy_url {
        Some(proxy_url) => {
            debug!("Routing traffic through proxy {}", proxy_url);
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                GetZapError::Config(format!("Invalid proxy URL {proxy_url}: {e}"))
            })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    Ok(builder)
}

/// Follows up to ten redirects. A hop to plain HTTP is refused unless HTTP is
/// allowed, so a redirect can never downgrade an HTTPS transfer.
fn redirect_policy(allow_http: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error(GetZapError::Network(format!(
                "Too many redirects (more than {MAX_REDIRECTS})"
            )))
        } else if attempt.url().scheme() == "http" && !allow_http {
            let target = attempt.url().to_string();
            warn!("Refusing redirect to unencrypted {}", target);
            attempt.error(GetZapError::InsecureProtocol(target))
        } else {
            attempt.follow()
        }
    })
}

pub fn network_error(url: &str, err: reqwest::Error) -> GetZapError {
    if let Some(refused) = refused_redirect(&err) {
        return refused;
    }
    debug!("HTTP request failed for {url}: {err}");
    GetZapError::Network(format!("HTTP request failed for {url}: {err}"))
}

/// The error raised by `redirect_policy`, if that is what stopped the request.
fn refused_redirect(err: &reqwest::Error) -> Option<GetZapError> {
    if !err.is_redirect() {
        return None;
    }
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(refused) = inner.downcast_ref::<GetZapError>() {
            return Some(refused.clone());
        }
        source = inner.source();
    }
    None
}

/// Maps an unsuccessful API response to the error kinds callers branch on.
pub fn status_error(response: &Response, url: &str) -> GetZapError {
    let status = response.status();
    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0");
    match status {
        StatusCode::UNAUTHORIZED => {
            GetZapError::Auth(format!("Credentials rejected (401) for {url}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            GetZapError::RateLimit(format!("Too many requests (429) for {url}"))
        }
        StatusCode::FORBIDDEN if rate_limited => {
            GetZapError::RateLimit(format!("API rate limit exhausted for {url}"))
        }
        StatusCode::FORBIDDEN => GetZapError::Auth(format!("Access forbidden (403) for {url}")),
        _ => GetZapError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        },
    }
}
