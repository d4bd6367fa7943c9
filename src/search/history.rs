// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Recent search history, persisted through a `KeyValueStore`.
//!
//! Most-recent-first, deduplicated, and bounded. The store holds the list as a
//! JSON array of strings under one key. This type is the only writer of that
//! key.
//!
//! **Invariants**:
//! - `len() <= limit`
//! - no two entries are equal
//! - every entry is non-empty and already trimmed

use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Default number of entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Default storage key.
pub const DEFAULT_HISTORY_KEY: &str = "siftbox.search_history";

/// Bounded most-recent-first list of settled queries.
#[derive(Debug)]
pub struct SearchHistoryStore<S> {
    store: S,
    key: String,
    limit: usize,
    entries: Vec<String>,
}

impl<S: KeyValueStore> SearchHistoryStore<S> {
    /// Create an empty history. Call `load` to pick up persisted entries.
    pub fn new(store: S, key: impl Into<String>, limit: usize) -> Self {
        Self {
            store,
            key: key.into(),
            limit,
            entries: Vec::with_capacity(limit),
        }
    }

    /// Create with the default key and limit.
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, DEFAULT_HISTORY_KEY, DEFAULT_HISTORY_LIMIT)
    }

    /// Read the persisted list, replacing the in-memory one.
    ///
    /// Anything that is not a JSON array of strings loads as an empty history.
    /// A list written by an older build with a larger limit, or edited by hand,
    /// is re-normalized on the way in.
    pub fn load(&mut self) -> &[String] {
        self.entries.clear();

        let Some(raw) = self.store.get(&self.key) else {
            return &self.entries;
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(stored) => {
                for query in stored {
                    let query = query.trim();
                    if query.is_empty() || self.entries.iter().any(|e| e == query) {
                        continue;
                    }
                    if self.entries.len() == self.limit {
                        break;
                    }
                    self.entries.push(query.to_string());
                }
                debug!(key = %self.key, entries = self.entries.len(), "loaded search history");
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "malformed search history, starting empty");
            }
        }

        &self.entries
    }

    /// Push a settled query to the front.
    ///
    /// Returns `true` if the history changed. Blank queries and a repeat of the
    /// current front entry are ignored.
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() || self.limit == 0 {
            return false;
        }
        if self.entries.first().is_some_and(|front| front == query) {
            return false;
        }

        self.entries.retain(|e| e != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(self.limit);
        self.persist();
        true
    }

    /// Remove one entry. Returns `true` if it was present.
    pub fn remove(&mut self, query: &str) -> bool {
        let query = query.trim();
        let before = self.entries.len();
        self.entries.retain(|e| e != query);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Entries, most recent first.
    pub fn list(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode search history");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &json) {
            // The in-memory list stays authoritative for this session.
            warn!(key = %self.key, error = %e, "failed to persist search history");
        }
    }
}
