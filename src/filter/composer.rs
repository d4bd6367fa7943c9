// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use crate::filter::predicate::{EffectiveQuery, FacetSelection};
use crate::types::Record;

/// Holds the settled query and facet selections for one page.
///
/// Each page supplies its own searchable fields; the composer never assumes a
/// schema.
#[derive(Debug, Clone, Default)]
pub struct FilterComposer {
    searchable_fields: Vec<String>,
    query: String,
    facets: FacetSelection,
}

impl FilterComposer {
    pub fn new<I, S>(searchable_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            searchable_fields: searchable_fields.into_iter().map(Into::into).collect(),
            query: String::new(),
            facets: FacetSelection::new(),
        }
    }

    /// Set the settled query text.
    pub fn set_query(&mut self, settled: impl Into<String>) {
        self.query = settled.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the selection for a facet.
    pub fn set_facet<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.facets.set(name, values);
    }

    /// Remove any selection for a facet.
    pub fn clear_facet(&mut self, name: &str) {
        self.facets.clear(name);
    }

    /// Remove all facet selections. The query is kept.
    pub fn clear_all(&mut self) {
        self.facets.clear_all();
    }

    pub fn facets(&self) -> &FacetSelection {
        &self.facets
    }

    pub fn searchable_fields(&self) -> &[String] {
        &self.searchable_fields
    }

    /// Snapshot of the current query and facets.
    pub fn effective_query(&self) -> EffectiveQuery {
        EffectiveQuery::new(
            self.query.clone(),
            self.searchable_fields.clone(),
            self.facets.clone(),
        )
    }

    /// An owned predicate over the current state.
    ///
    /// Later changes to the composer do not affect a predicate already handed out.
    pub fn predicate(&self) -> impl Fn(&Record) -> bool + Clone + Send + Sync + 'static {
        let effective = self.effective_query();
        move |record: &Record| effective.matches(record)
    }
}

/// Distinct values of `field` across `records`, in first-seen order.
///
/// List-valued fields contribute each element. Useful for building a facet's
/// vocabulary from whatever the provider returned.
pub fn facet_values(records: &[Record], field: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut values = Vec::new();
    for value in records.iter().filter_map(|r| r.get(field)) {
        for scalar in value.scalars() {
            let text = scalar.as_text();
            if seen.insert(text.clone()) {
                values.push(text);
            }
        }
    }
    values
}
