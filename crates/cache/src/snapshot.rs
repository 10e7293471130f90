//! The in-memory image of a backing file
//!
//! Every mutating store operation is `load -> apply -> persist`, and the apply
//! step only ever works on a [`Snapshot`]. Nothing in here touches the disk.

use crate::entry::Entry;
use filecache_core::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Complete key to entry mapping of one store, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: IndexMap<String, Entry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse backing file content
    ///
    /// Blank content (a truncated file) and a bare `[]` (how an emptied mapping
    /// was historically encoded) both parse as an empty snapshot.
    pub fn parse(content: &[u8]) -> serde_json::Result<Self> {
        let trimmed = content.trim_ascii();
        if trimmed.is_empty() || trimmed == b"[]" {
            return Ok(Self::default());
        }
        serde_json::from_slice(trimmed)
    }

    /// Serialize the complete mapping as a JSON object
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    /// Insert or overwrite; an overwritten key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(key.into(), entry)
    }

    /// Remove `key`, failing with [`Error::KeyNotFound`] if it is absent
    pub fn remove(&mut self, key: &str) -> Result<Entry> {
        self.entries
            .shift_remove(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Drop every entry expired at `now` and return how many were dropped
    pub fn sweep_expired(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    pub fn into_entries(self) -> IndexMap<String, Entry> {
        self.entries
    }
}

impl FromIterator<(String, Entry)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
