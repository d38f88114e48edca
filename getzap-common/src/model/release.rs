// getzap-common/src/model/release.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Selects which release(s) an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseIdentifier {
    Latest,
    All,
    Tag(String),
}

impl ReleaseIdentifier {
    /// Only concrete tags can be addressed in the cache tier.
    pub fn is_pinned(&self) -> bool {
        matches!(self, ReleaseIdentifier::Tag(_))
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            ReleaseIdentifier::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

impl FromStr for ReleaseIdentifier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "latest" | "" => ReleaseIdentifier::Latest,
            "all" => ReleaseIdentifier::All,
            tag => ReleaseIdentifier::Tag(tag.to_string()),
        })
    }
}

impl fmt::Display for ReleaseIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseIdentifier::Latest => f.write_str("latest"),
            ReleaseIdentifier::All => f.write_str("all"),
            ReleaseIdentifier::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Snapshot of a release as reported by the origin. Never mutated after
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl ReleaseRecord {
    pub fn created_display(&self) -> String {
        self.created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn published_display(&self) -> String {
        self.published_at
            .or(self.created_at)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub browser_download_url: String,
}
