//! Known-broken endpoint filter
//!
//! A static deny-list consulted before any network call. Exact URLs cover
//! stations that are simply dead; patterns cover endpoints whose URLs embed
//! volatile tokens around a stable path fragment.

use std::collections::HashSet;

use crate::constants::broken;

/// Immutable set of endpoints that are known not to work
#[derive(Debug, Clone, Default)]
pub struct BrokenEndpointSet {
    urls: HashSet<String>,
    patterns: Vec<String>,
}

impl BrokenEndpointSet {
    /// Empty filter that lets everything through
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in list of dead endpoints
    pub fn builtin() -> Self {
        Self::empty().with_entries(
            broken::URLS.iter().map(|s| s.to_string()),
            broken::PATTERNS.iter().map(|s| s.to_string()),
        )
    }

    /// Extend the filter with extra exact URLs and substring patterns
    ///
    /// Blank entries are ignored; an empty pattern would match everything.
    pub fn with_entries<U, P>(mut self, urls: U, patterns: P) -> Self
    where
        U: IntoIterator<Item = String>,
        P: IntoIterator<Item = String>,
    {
        self.urls.extend(
            urls.into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        );
        for pattern in patterns {
            let pattern = pattern.trim();
            if !pattern.is_empty() && !self.patterns.iter().any(|p| p == pattern) {
                self.patterns.push(pattern.to_string());
            }
        }
        self
    }

    /// True if `url` is listed exactly or contains a broken pattern
    pub fn is_known_broken(&self, url: &str) -> bool {
        self.urls.contains(url) || self.patterns.iter().any(|p| url.contains(p.as_str()))
    }

    /// Number of exact URLs and number of patterns
    pub fn counts(&self) -> (usize, usize) {
        (self.urls.len(), self.patterns.len())
    }

    /// True when nothing is filtered
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.patterns.is_empty()
    }
}
