// getzap-common/src/model/platform.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// The (os, arch) constraint inferred from an asset name. `None` fields are
/// unconstrained and match any host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformTag {
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl PlatformTag {
    pub fn new(os: Option<&str>, arch: Option<&str>) -> Self {
        Self {
            os: os.map(str::to_string),
            arch: arch.map(str::to_string),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.os.is_none() && self.arch.is_none()
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "os='{}', arch='{}'",
            self.os.as_deref().unwrap_or(""),
            self.arch.as_deref().unwrap_or("")
        )
    }
}

/// The local host, spelled with the same vocabulary asset names use
/// (`linux`/`darwin`/`windows`, `amd64`/`arm64`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    pub fn current() -> Self {
        Self::from_rust_consts(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_rust_consts(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            other => other,
        };
        Self::new(os, arch)
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
