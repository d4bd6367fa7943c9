// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine configuration.
//!
//! Each page differs only in its field lists and a couple of timings, so that is
//! all there is to configure. Loaded from JSON; every key is optional.
//!
//! ```json
//! {
//!   "debounceMs": 300,
//!   "historyLimit": 5,
//!   "searchableFields": ["name", "description"],
//!   "facetFields": ["status", "domain"],
//!   "filterMode": "client"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::search::{DEFAULT_HISTORY_KEY, DEFAULT_HISTORY_LIMIT};

/// Where filtering happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// The provider returns a superset; the session filters it locally.
    #[default]
    Client,
    /// The provider already applied the query; results are shown as returned.
    Server,
}

/// Configuration for one search session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Debounce delay for the search box.
    pub debounce_ms: u64,
    /// Maximum number of remembered queries.
    pub history_limit: usize,
    /// Storage key for the history list.
    pub history_key: String,
    /// Fields the free-text query is matched against.
    pub searchable_fields: Vec<String>,
    /// Fields offered as facets.
    pub facet_fields: Vec<String>,
    pub filter_mode: FilterMode,
    /// Replace optimistic records with the server's copy on success.
    pub reconcile_with_server: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            history_limit: DEFAULT_HISTORY_LIMIT,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            searchable_fields: vec!["name".to_string(), "description".to_string()],
            facet_fields: Vec::new(),
            filter_mode: FilterMode::Client,
            reconcile_with_server: true,
        }
    }
}

impl EngineConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.searchable_fields.is_empty() {
            return Err(ConfigError::Invalid(
                "searchableFields must name at least one field".to_string(),
            ));
        }
        if self.searchable_fields.iter().chain(&self.facet_fields).any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid("field names must not be blank".to_string()));
        }
        if self.history_key.trim().is_empty() {
            return Err(ConfigError::Invalid("historyKey must not be blank".to_string()));
        }
        Ok(())
    }
}
