// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! One page's search session: settled query in, results out.
//!
//! ```text
//! SearchController ──settled──▶ SearchSession ──fetch(tag n)──▶ DataProvider
//!                                 │      ▲                          │
//!                                 │      └──── response(tag n) ◀────┘
//!                                 ▼
//!                     history.record   index.replace (iff n == latest)
//!                                                  │
//!                                                  ▼
//!                                        EngineEvent::ResultsChanged
//! ```
//!
//! Fetches are never cancelled. Responses can come back in any order, so each
//! fetch carries a sequence number taken at issue time, and only the response
//! whose number is still the latest gets applied. Everything older is dropped
//! on arrival, success or failure.
//!
//! The tag comparison and the index write happen under the same write lock, so
//! a newer fetch can never be overwritten by an older one that checked first.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::aggregate::{build_trend, group_by, AggregationBucket, Trend, TrendPoint};
use crate::config::{EngineConfig, FilterMode};
use crate::error::{AggregationError, EngineError};
use crate::events::{EngineEvent, EventSender};
use crate::filter::{EffectiveQuery, FacetSelection, FilterComposer};
use crate::index::{RecordIndex, SharedIndex};
use crate::mutate::OptimisticMutator;
use crate::provider::DataProvider;
use crate::search::{SearchController, SearchHistoryStore, SettledQueries};
use crate::store::KeyValueStore;
use crate::types::Record;

/// What happened to a fetch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was current and is now in the index.
    Applied { tag: u64, results: usize },
    /// A newer fetch was issued while this one was in flight; the response was dropped.
    Stale { tag: u64, latest: u64 },
}

/// A fetch that has been tagged but not yet awaited.
#[derive(Debug, Clone)]
pub struct IssuedFetch {
    pub tag: u64,
    pub query: EffectiveQuery,
}

/// Search, filter and results state for one page.
pub struct SearchSession {
    config: EngineConfig,
    provider: Arc<dyn DataProvider>,
    composer: Mutex<FilterComposer>,
    history: Mutex<SearchHistoryStore<Arc<dyn KeyValueStore>>>,
    index: SharedIndex,
    mutator: OptimisticMutator,
    issued: AtomicU64,
    events: EventSender,
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("config", &self.config)
            .field("issued", &self.issued.load(Ordering::SeqCst))
            .field("records", &self.index.read().len())
            .finish_non_exhaustive()
    }
}

impl SearchSession {
    /// Build a session and load its persisted history.
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn DataProvider>,
        store: Arc<dyn KeyValueStore>,
        events: EventSender,
    ) -> Self {
        let mut history =
            SearchHistoryStore::new(store, config.history_key.clone(), config.history_limit);
        history.load();

        let index = RecordIndex::new().shared();
        let mutator = OptimisticMutator::new(Arc::clone(&index), events.clone())
            .reconcile_with_server(config.reconcile_with_server);

        Self {
            composer: Mutex::new(FilterComposer::new(config.searchable_fields.clone())),
            history: Mutex::new(history),
            index,
            mutator,
            issued: AtomicU64::new(0),
            config,
            provider,
            events,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A debounced controller wired to this session's events.
    pub fn controller(&self) -> (SearchController, SettledQueries) {
        let (controller, settled) = SearchController::new(self.config.debounce());
        (controller.with_events(self.events.clone()), settled)
    }

    /// A handle on the session's mutator. Pending writes are tracked by the
    /// index, so all handles agree on what is in flight.
    pub fn mutator(&self) -> OptimisticMutator {
        self.mutator.clone()
    }

    pub fn index(&self) -> SharedIndex {
        Arc::clone(&self.index)
    }

    /// Remembered queries, most recent first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().list().to_vec()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    pub fn facets(&self) -> FacetSelection {
        self.composer.lock().facets().clone()
    }

    pub fn effective_query(&self) -> EffectiveQuery {
        self.composer.lock().effective_query()
    }

    /// The visible results for the current query and facets.
    pub fn results(&self) -> Vec<Record> {
        let query = self.effective_query();
        let index = self.index.read();
        self.visible(&index, &query)
    }

    /// Tag of the most recently issued fetch (0 before the first).
    pub fn latest_tag(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Query path
    // -------------------------------------------------------------------------

    /// Record a settled query and fetch for it.
    pub async fn apply_settled(&self, query: &str) -> Result<FetchOutcome, EngineError> {
        let issued = self.settle(query);
        self.complete(issued).await
    }

    /// Replace one facet's selection and fetch.
    pub async fn set_facet<I, V>(&self, name: &str, values: I) -> Result<FetchOutcome, EngineError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.composer.lock().set_facet(name, values);
        self.refresh().await
    }

    /// Drop one facet's selection and fetch.
    pub async fn clear_facet(&self, name: &str) -> Result<FetchOutcome, EngineError> {
        self.composer.lock().clear_facet(name);
        self.refresh().await
    }

    /// Fetch for the current query and facets.
    pub async fn refresh(&self) -> Result<FetchOutcome, EngineError> {
        let issued = self.issue();
        self.complete(issued).await
    }

    /// Synchronous half of `apply_settled`: history, composer, tag.
    pub fn settle(&self, query: &str) -> IssuedFetch {
        self.history.lock().record(query);
        self.composer.lock().set_query(query);
        self.issue()
    }

    /// Tag a fetch for the current effective query.
    pub fn issue(&self) -> IssuedFetch {
        let query = self.composer.lock().effective_query();
        let tag = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(tag, query = %query.query(), "fetch issued");
        IssuedFetch { tag, query }
    }

    /// Await the provider and apply the response if it is still current.
    pub async fn complete(&self, issued: IssuedFetch) -> Result<FetchOutcome, EngineError> {
        let IssuedFetch { tag, query } = issued;
        let response = self.provider.fetch(&query).await;

        let mut index = self.index.write();
        let latest = self.issued.load(Ordering::SeqCst);
        if tag != latest {
            debug!(tag, latest, ok = response.is_ok(), "discarding stale response");
            return Ok(FetchOutcome::Stale { tag, latest });
        }

        match response {
            Ok(records) => {
                index.replace(records);
                let results = self.visible(&index, &query);
                drop(index);

                debug!(tag, results = results.len(), "results applied");
                let count = results.len();
                self.events.emit(EngineEvent::ResultsChanged(results));
                Ok(FetchOutcome::Applied { tag, results: count })
            }
            Err(error) => {
                drop(index);
                warn!(tag, error = %error, "fetch failed, keeping last results");
                self.events.emit(EngineEvent::FetchFailed {
                    error: error.clone(),
                });
                Err(EngineError::TransientFetch(error))
            }
        }
    }

    /// Drive a settled-query stream until the controller goes away.
    ///
    /// Each settled value is recorded and tagged in arrival order, then its
    /// fetch runs on its own task so a slow response cannot hold up newer ones.
    pub async fn run(self: Arc<Self>, mut settled: SettledQueries) {
        while let Some(query) = settled.recv().await {
            let issued = self.settle(&query);
            let session = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = session.complete(issued).await {
                    debug!(error = %e, "settled query fetch failed");
                }
            });
        }
        debug!("settled query stream closed");
    }

    fn visible(&self, index: &RecordIndex, query: &EffectiveQuery) -> Vec<Record> {
        match self.config.filter_mode {
            FilterMode::Client => index.query(|r| query.matches(r)),
            FilterMode::Server => index.records().to_vec(),
        }
    }

    // -------------------------------------------------------------------------
    // Rollups
    // -------------------------------------------------------------------------

    /// Group the current snapshot (unfiltered) and publish the buckets.
    pub fn aggregate<K, F, M>(&self, key_fn: F, match_fn: M) -> Vec<AggregationBucket>
    where
        K: Into<String>,
        F: Fn(&Record) -> K,
        M: Fn(&Record) -> bool,
    {
        let buckets = {
            let index = self.index.read();
            group_by(index.records(), key_fn, match_fn)
        };
        self.events.emit(EngineEvent::AggregationReady(buckets.clone()));
        buckets
    }

    /// Validate a trend series and publish it.
    pub fn trend(&self, points: Vec<TrendPoint>) -> Result<Trend, AggregationError> {
        let trend = build_trend(points)?;
        self.events.emit(EngineEvent::TrendReady(trend.clone()));
        Ok(trend)
    }
}
