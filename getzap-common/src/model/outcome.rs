// getzap-common/src/model/outcome.rs
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Cache,
    Origin,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Cache => f.write_str("Artifactory"),
            Tier::Origin => f.write_str("GitHub"),
        }
    }
}

/// Terminal result of one resolution request. Errors travel separately as
/// `GetZapError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Neither tier was enabled.
    NothingToDo,
    Retrieved { tier: Tier, files: Vec<PathBuf> },
    /// The cache tier had nothing and no origin fallback was permitted.
    CacheMiss,
    OriginMiss { release: String },
}

impl Outcome {
    pub fn files_written(&self) -> usize {
        match self {
            Outcome::Retrieved { files, .. } => files.len(),
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Retrieved { .. } | Outcome::NothingToDo)
    }
}
