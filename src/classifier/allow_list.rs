use serde::{Deserialize, Serialize};

/// Endpoints whose failures never produce a user notification.
///
/// Auth endpoints report failures on their own screens, so a generic toast
/// on top would be noise. Matching is by substring of the request URL.
pub const DEFAULT_ALLOW_LIST: &[&str] = &["/api/login", "/api/refresh-token", "/auth/login"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList {
    patterns: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        !url.is_empty() && self.patterns.iter().any(|p| url.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOW_LIST.iter().copied())
    }
}

impl From<Vec<String>> for AllowList {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}
