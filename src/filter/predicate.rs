// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! The effective query: settled text plus active facets, as one value.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::Record;
use crate::utils::{normalize, value_contains};

/// Facet name → selected values. An empty set means no filter on that facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetSelection {
    selections: BTreeMap<String, BTreeSet<String>>,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection for one facet.
    pub fn set<I, V>(&mut self, facet: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        self.selections.insert(facet.into(), values);
    }

    /// Empty one facet's selection.
    pub fn clear(&mut self, facet: &str) {
        self.selections.remove(facet);
    }

    pub fn clear_all(&mut self) {
        self.selections.clear();
    }

    /// Selected values for a facet (empty if none).
    pub fn get(&self, facet: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(facet)
    }

    /// Facets with at least one selected value, in name order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.selections
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name.as_str(), values))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Does `record` satisfy every active facet?
    pub fn matches(&self, record: &Record) -> bool {
        self.active().all(|(facet, selected)| {
            record.get(facet).is_some_and(|value| {
                value
                    .scalars()
                    .any(|scalar| selected.contains(&scalar.as_text()))
            })
        })
    }
}

/// Settled query text, searchable fields and facets, frozen at one moment.
///
/// This is what a `DataProvider` receives, and what a client-side filter
/// evaluates. The query is normalized once at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveQuery {
    query: String,
    needle: String,
    searchable_fields: Vec<String>,
    facets: FacetSelection,
}

impl EffectiveQuery {
    pub fn new(query: impl Into<String>, searchable_fields: Vec<String>, facets: FacetSelection) -> Self {
        let query = query.into();
        let needle = normalize(&query);
        Self {
            query,
            needle,
            searchable_fields,
            facets,
        }
    }

    /// The settled query as typed.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The query as it is matched: lowercased, accents stripped, whitespace collapsed.
    pub fn normalized_query(&self) -> &str {
        &self.needle
    }

    pub fn searchable_fields(&self) -> &[String] {
        &self.searchable_fields
    }

    pub fn facets(&self) -> &FacetSelection {
        &self.facets
    }

    /// Does the text part match? An empty query matches everything.
    pub fn matches_text(&self, record: &Record) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        self.searchable_fields.iter().any(|field| {
            record
                .get(field)
                .is_some_and(|value| value_contains(value, &self.needle))
        })
    }

    /// Full predicate: text AND every active facet.
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_text(record) && self.facets.matches(record)
    }
}
