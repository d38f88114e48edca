// getzap-common/src/model/pattern.rs
use std::fmt;

/// Repository-relative path expression scoping a cache tier operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryPattern(String);

impl RepositoryPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into().trim_start_matches('/').to_string())
    }

    /// All artifacts stored for one release: `<tag>/**`.
    pub fn for_release(tag: &str) -> Self {
        Self::new(format!("{tag}/**"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_wildcards(&self) -> bool {
        self.0.contains(['*', '?', '['])
    }

    /// Leading path components that contain no wildcard, joined with `/`.
    /// For `v1.2.0/**` this is `v1.2.0`; for a plain path it is the path
    /// itself.
    pub fn literal_prefix(&self) -> String {
        if !self.has_wildcards() {
            return self.0.trim_end_matches('/').to_string();
        }
        self.0
            .split('/')
            .take_while(|segment| !segment.contains(['*', '?', '[']))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for RepositoryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
