//! Run-scoped stream resolution cache
//!
//! Maps an advertised URL to the URL it last resolved to during this run. A
//! failed re-check evicts the entry, so lookups only ever return URLs that
//! succeeded in the current run.

use std::collections::HashMap;
use std::sync::Mutex;

/// Advertised URL -> last known valid resolved URL
#[derive(Debug, Default)]
pub struct StreamCache {
    entries: Mutex<HashMap<String, String>>,
}

impl StreamCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved URL recorded for `advertised`, if any
    pub fn get(&self, advertised: &str) -> Option<String> {
        self.lock().get(advertised).cloned()
    }

    /// Record a successful resolution; last write wins
    pub fn insert(&self, advertised: impl Into<String>, resolved: impl Into<String>) {
        self.lock().insert(advertised.into(), resolved.into());
    }

    /// Drop the entry for `advertised` after a failed re-check
    pub fn evict(&self, advertised: &str) -> Option<String> {
        self.lock().remove(advertised)
    }

    /// Number of cached resolutions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map of strings
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
