// getzap-net/src/github.rs
//! Origin tier backed by the GitHub releases REST API.
use getzap_common::config::GithubConfig;
use getzap_common::error::{GetZapError, Result};
use getzap_common::model::{
    AssetBody, AssetRecord, ReleaseIdentifier, ReleaseRecord, TransferOptions,
};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LOCATION};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::http::{client_builder, network_error, status_error};
use crate::tier::OriginTier;
use crate::validation::validate_url;

const GITHUB_JSON: &str = "application/vnd.github+json";
const OCTET_STREAM: &str = "application/octet-stream";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: u32 = 100;

pub struct GithubClient {
    config: GithubConfig,
    api: Client,
    /// Same headers, but redirects are surfaced instead of followed.
    assets: Client,
    allow_http: bool,
}

impl GithubClient {
    pub fn new(config: GithubConfig, options: &TransferOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        if let Some(token) = &config.token {
            debug!("Adding GitHub API token to request headers.");
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                GetZapError::Config(format!("GitHub token is not a valid header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            warn!(
                "You do not have GET_ZAP_GHTOKEN set. This will limit the number of requests you can make to the GitHub API."
            );
        }

        let api = client_builder(options)?
            .default_headers(headers.clone())
            .build()
            .map_err(|e| GetZapError::Config(format!("Failed to build HTTP client: {e}")))?;
        let assets = client_builder(options)?
            .default_headers(headers)
            .redirect(Policy::none())
            .build()
            .map_err(|e| GetZapError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            api,
            assets,
            allow_http: options.allow_insecure_http,
        })
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.config.api_base_url, self.config.owner, self.config.repo, suffix
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        validate_url(url, self.allow_http)?;
        debug!("Fetching data from GitHub API: {}", url);
        let response = self.api.get(url).send().map_err(|e| network_error(url, e))?;
        if !response.status().is_success() {
            let err = status_error(&response, url);
            error!("GitHub API request to {} failed: {}", url, err);
            return Err(err);
        }
        response.json::<T>().map_err(|e| {
            error!("Failed to parse JSON response from {}: {}", url, e);
            GetZapError::from(e)
        })
    }

    fn latest_release(&self) -> Result<ReleaseRecord> {
        match self.get_json(&self.repo_url("/releases/latest")) {
            Err(GetZapError::HttpStatus { status: 404, .. }) => {
                Err(GetZapError::NotFound("latest".to_string()))
            }
            other => other,
        }
    }

    fn find_release(&self, tag: &str) -> Result<ReleaseRecord> {
        self.list_releases()?
            .into_iter()
            .find(|release| release.tag_name == tag)
            .ok_or_else(|| GetZapError::NotFound(tag.to_string()))
    }
}

impl OriginTier for GithubClient {
    fn resolve_release(&self, id: &ReleaseIdentifier) -> Result<ReleaseRecord> {
        match id {
            ReleaseIdentifier::Latest => self.latest_release(),
            ReleaseIdentifier::Tag(tag) => self.find_release(tag),
            ReleaseIdentifier::All => Err(GetZapError::Unsupported(
                "Downloading assets for all releases is not supported. Please use 'latest' or specific release.".to_string(),
            )),
        }
    }

    fn list_releases(&self) -> Result<Vec<ReleaseRecord>> {
        self.get_json(&self.repo_url(&format!("/releases?per_page={PER_PAGE}")))
    }

    fn list_assets(&self, release: &ReleaseRecord) -> Result<Vec<AssetRecord>> {
        self.get_json(&self.repo_url(&format!(
            "/releases/{}/assets?per_page={PER_PAGE}",
            release.id
        )))
    }

    fn open_asset(&self, asset: &AssetRecord) -> Result<AssetBody> {
        let url = self.repo_url(&format!("/releases/assets/{}", asset.id));
        validate_url(&url, self.allow_http)?;
        debug!("Requesting asset {} from {}", asset.name, url);
        let response = self
            .assets
            .get(&url)
            .header(ACCEPT, OCTET_STREAM)
            .send()
            .map_err(|e| network_error(&url, e))?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| GetZapError::HttpStatus {
                    status: status.as_u16(),
                    url: url.clone(),
                })?;
            debug!("Asset {} redirected to {}", asset.name, location);
            return Ok(AssetBody::RedirectUrl(location.to_string()));
        }
        if status == StatusCode::OK {
            debug!("Asset {} served directly", asset.name);
            return Ok(AssetBody::Stream(Box::new(response)));
        }
        Err(status_error(&response, &url))
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.config.owner, self.config.repo)
    }
}
