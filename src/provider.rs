// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Where records come from.
//!
//! A `DataProvider` may be a server round-trip or a static fixture filtered in
//! process; the session does not care which. It hands over the effective query
//! and takes back a collection.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ProviderError;
use crate::filter::EffectiveQuery;
use crate::types::Record;

/// Source of record collections.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch the collection for an effective query.
    ///
    /// Server-backed providers may filter remotely; others may return the whole
    /// collection and leave filtering to the session.
    async fn fetch(&self, query: &EffectiveQuery) -> Result<Vec<Record>, ProviderError>;
}

#[async_trait]
impl<P: DataProvider + ?Sized> DataProvider for Arc<P> {
    async fn fetch(&self, query: &EffectiveQuery) -> Result<Vec<Record>, ProviderError> {
        (**self).fetch(query).await
    }
}

/// An in-process fixture, filtered by the effective query.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    records: Vec<Record>,
    latency: Option<Duration>,
    prefilter: bool,
}

impl StaticProvider {
    /// A provider that applies the effective query before returning.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            latency: None,
            prefilter: true,
        }
    }

    /// A provider that always returns the full fixture.
    pub fn unfiltered(records: Vec<Record>) -> Self {
        Self {
            prefilter: false,
            ..Self::new(records)
        }
    }

    /// Simulate a network round-trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

#[async_trait]
impl DataProvider for StaticProvider {
    async fn fetch(&self, query: &EffectiveQuery) -> Result<Vec<Record>, ProviderError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let records: Vec<Record> = if self.prefilter {
            self.records.iter().filter(|r| query.matches(r)).cloned().collect()
        } else {
            self.records.clone()
        };
        debug!(query = %query.query(), returned = records.len(), "static fetch");
        Ok(records)
    }
}
