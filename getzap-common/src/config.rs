// getzap-common/src/config.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{GetZapError, Result};
use crate::model::{ReleaseIdentifier, TransferOptions};

/// Prefix for environment overrides, e.g. `GET_ZAP_GHTOKEN`.
pub const ENV_PREFIX: &str = "GET_ZAP_";
const CONFIG_FILE_NAME: &str = ".get_zap.json";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const REDACTED: &str = "********";

pub const KEY_GH_OWNER: &str = "ghOwner";
pub const KEY_GH_REPO: &str = "ghRepo";
pub const KEY_GH_TOKEN: &str = "ghToken";
pub const KEY_GH_RELEASE: &str = "ghRelease";
pub const KEY_GH_ASSET: &str = "ghAsset";
pub const KEY_GH_API_URL: &str = "ghApiUrl";
pub const KEY_RT_URL: &str = "rtUrl";
pub const KEY_RT_API_KEY: &str = "rtApiKey";
pub const KEY_RT_USER: &str = "rtUser";
pub const KEY_RT_REPO: &str = "rtRepo";
pub const KEY_RT_PATH: &str = "rtPath";
pub const KEY_USE_RT: &str = "useRt";
pub const KEY_USE_GH: &str = "useGh";
pub const KEY_LOCAL_ROOT: &str = "localRoot";
pub const KEY_SKIP_CERT_CHECK: &str = "skipCertCheck";
pub const KEY_ALLOW_HTTP: &str = "allowHttp";
pub const KEY_PROXY: &str = "proxy";
pub const KEY_SHOW_PROGRESS: &str = "showProgress";

const ALL_KEYS: &[&str] = &[
    KEY_GH_OWNER,
    KEY_GH_REPO,
    KEY_GH_TOKEN,
    KEY_GH_RELEASE,
    KEY_GH_ASSET,
    KEY_GH_API_URL,
    KEY_RT_URL,
    KEY_RT_API_KEY,
    KEY_RT_USER,
    KEY_RT_REPO,
    KEY_RT_PATH,
    KEY_USE_RT,
    KEY_USE_GH,
    KEY_LOCAL_ROOT,
    KEY_SKIP_CERT_CHECK,
    KEY_ALLOW_HTTP,
    KEY_PROXY,
    KEY_SHOW_PROGRESS,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    pub release: String,
    pub token: Option<String>,
    pub asset: String,
    pub api_base_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: "project-chip".to_string(),
            repo: "zap".to_string(),
            release: "latest".to_string(),
            token: None,
            asset: "local".to_string(),
            api_base_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

impl GithubConfig {
    pub fn release_identifier(&self) -> ReleaseIdentifier {
        // FromStr for ReleaseIdentifier is infallible.
        self.release
            .parse()
            .unwrap_or(ReleaseIdentifier::Latest)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactoryConfig {
    pub url: String,
    pub api_key: String,
    pub user: String,
    pub repo: String,
    pub path: String,
}

impl ArtifactoryConfig {
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty() && !self.api_key.is_empty() && !self.user.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub github: GithubConfig,
    pub artifactory: ArtifactoryConfig,
    pub use_rt: bool,
    pub use_gh: bool,
    pub local_root: PathBuf,
    pub transfer: TransferOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            artifactory: ArtifactoryConfig::default(),
            use_rt: true,
            use_gh: true,
            local_root: PathBuf::from("."),
            transfer: TransferOptions::default(),
        }
    }
}

impl Config {
    /// Defaults, then the JSON config file, then `GET_ZAP_*` environment
    /// variables. Command line flags are applied by the caller on top.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        debug!("Loading get-zap configuration");
        Self::load_with(config_file, |name| env::var(name).ok())
    }

    pub fn load_with<F>(config_file: Option<&Path>, env_lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        match config_file {
            Some(path) => {
                // An explicitly named file must exist.
                config.apply_file(path)?;
            }
            None => {
                if let Some(path) = default_config_path().filter(|p| p.is_file()) {
                    config.apply_file(&path)?;
                } else {
                    debug!("No {} found in home directory.", CONFIG_FILE_NAME);
                }
            }
        }

        for key in ALL_KEYS {
            let var = format!("{ENV_PREFIX}{}", key.to_uppercase());
            if let Some(value) = env_lookup(&var).filter(|v| !v.is_empty()) {
                debug!("Applying environment override {}", var);
                config.set(key, &value)?;
            }
        }

        debug!("Configuration loaded successfully.");
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        debug!("Reading config file: {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| {
            GetZapError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            GetZapError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let Value::Object(entries) = value else {
            return Err(GetZapError::Config(format!(
                "Config file {} must contain a JSON object",
                path.display()
            )));
        };
        for (key, value) in entries {
            let text = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => continue,
                other => {
                    warn!("Ignoring non-scalar config value for '{}': {}", key, other);
                    continue;
                }
            };
            if ALL_KEYS.contains(&key.as_str()) {
                self.set(&key, &text)?;
            } else {
                debug!("Ignoring unknown config key '{}'", key);
            }
        }
        Ok(())
    }

    /// Sets a single setting by its key name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            KEY_GH_OWNER => self.github.owner = value.to_string(),
            KEY_GH_REPO => self.github.repo = value.to_string(),
            KEY_GH_TOKEN => self.github.token = Some(value.to_string()).filter(|t| !t.is_empty()),
            KEY_GH_RELEASE => self.github.release = value.to_string(),
            KEY_GH_ASSET => self.github.asset = value.to_string(),
            KEY_GH_API_URL => self.github.api_base_url = value.trim_end_matches('/').to_string(),
            KEY_RT_URL => self.artifactory.url = value.trim_end_matches('/').to_string(),
            KEY_RT_API_KEY => self.artifactory.api_key = value.to_string(),
            KEY_RT_USER => self.artifactory.user = value.to_string(),
            KEY_RT_REPO => self.artifactory.repo = value.to_string(),
            KEY_RT_PATH => self.artifactory.path = value.to_string(),
            KEY_USE_RT => self.use_rt = parse_bool(key, value)?,
            KEY_USE_GH => self.use_gh = parse_bool(key, value)?,
            KEY_LOCAL_ROOT => self.local_root = PathBuf::from(value),
            KEY_SKIP_CERT_CHECK => self.transfer.skip_cert_check = parse_bool(key, value)?,
            KEY_ALLOW_HTTP => self.transfer.allow_insecure_http = parse_bool(key, value)?,
            KEY_PROXY => {
                if value.is_empty() {
                    self.transfer.proxy_url = None;
                } else {
                    self.transfer.set_proxy(value).map_err(|e| {
                        GetZapError::Config(format!("Invalid proxy URL '{value}': {e}"))
                    })?;
                }
            }
            KEY_SHOW_PROGRESS => self.transfer.show_progress = parse_bool(key, value)?,
            other => {
                return Err(GetZapError::Config(format!(
                    "Unknown configuration key '{other}'"
                )))
            }
        }
        Ok(())
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    /// A copy safe to log, with credentials masked.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        if copy.github.token.is_some() {
            copy.github.token = Some(REDACTED.to_string());
        }
        if !copy.artifactory.api_key.is_empty() {
            copy.artifactory.api_key = REDACTED.to_string();
        }
        copy
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(GetZapError::Config(format!(
            "Expected a boolean for '{key}', got '{value}'"
        ))),
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|ud| ud.home_dir().join(CONFIG_FILE_NAME))
}
