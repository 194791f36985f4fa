//! Local search over small in-memory lists, plus the recent-searches cache.

use std::collections::VecDeque;

use crate::error::{DatabaseError, Result};
use crate::storage::Database;

const RECENT_SEARCHES_KEY: &str = "recent_searches";

/// Default number of recent queries kept.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

pub trait Searchable {
    /// Text matched against query tokens.
    fn search_text(&self) -> String;
}

impl Searchable for String {
    fn search_text(&self) -> String {
        self.clone()
    }
}

impl Searchable for &str {
    fn search_text(&self) -> String {
        (*self).to_string()
    }
}

/// Items whose text contains every whitespace-separated token of `query`,
/// case-insensitively, in their original order. A blank query matches all.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    items
        .iter()
        .filter(|item| {
            let haystack = item.search_text().to_lowercase();
            tokens.iter().all(|t| haystack.contains(t.as_str()))
        })
        .collect()
}

/// Most-recent-first list of past queries, bounded by `capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSearches {
    entries: VecDeque<String>,
    capacity: usize,
}

impl RecentSearches {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Put `query` in front. Blank queries are ignored; an existing entry
    /// that differs only in case is moved rather than duplicated.
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() || self.capacity == 0 {
            return;
        }
        let lowered = query.to_lowercase();
        self.entries.retain(|e| e.to_lowercase() != lowered);
        self.entries.push_front(query.to_string());
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Read the cached list from the key-value table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored JSON is corrupt.
    pub fn load(db: &Database, capacity: usize) -> Result<Self> {
        let mut recent = Self::new(capacity);
        if let Some(json) = db.kv_get(RECENT_SEARCHES_KEY)? {
            let stored: Vec<String> =
                serde_json::from_str(&json).map_err(|e| DatabaseError::CorruptValue {
                    key: RECENT_SEARCHES_KEY.to_string(),
                    message: e.to_string(),
                })?;
            recent.entries = stored.into_iter().take(capacity).collect();
        }
        Ok(recent)
    }

    /// Overwrite the cached list (last write wins).
    pub fn save(&self, db: &Database) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        db.kv_set(RECENT_SEARCHES_KEY, &json)?;
        Ok(())
    }

    /// Drop the cached list. Returns whether anything was stored.
    pub fn forget(db: &Database) -> Result<bool> {
        Ok(db.kv_delete(RECENT_SEARCHES_KEY)?)
    }
}

impl Default for RecentSearches {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_LIMIT)
    }
}
