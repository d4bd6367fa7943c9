//! Client-side search, facet filtering and rollups for catalog dashboards.
//!
//! Catalog pages (data assets, business terms, KPIs, reports) all do the same
//! thing: a search box, a few facets, a list, some percentages on top, and an
//! edit that should show up before the server confirms it. This crate is that
//! shared core. It renders nothing; it takes records in and hands results and
//! events out.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  settled   ┌────────────────┐  effective  ┌──────────────┐
//! │ SearchController │──────────▶│ FilterComposer │────query───▶│ DataProvider │
//! │   (debounce)     │           │ (query+facets) │             └──────┬───────┘
//! └────────┬─────────┘           └────────────────┘                    │ records
//!          │ settled                                                    ▼
//!          ▼                        stale-response guard ──▶ ┌──────────────┐
//! ┌──────────────────┐                                        │ RecordIndex  │
//! │ SearchHistory    │                                        └──────┬───────┘
//! │ (KeyValueStore)  │                 ┌───────────────────┐         │
//! └──────────────────┘                 │ OptimisticMutator │◀────────┤
//!                                      └───────────────────┘         ▼
//!                                                             group_by / trends
//! ```
//!
//! `SearchSession` wires these together for one page and publishes
//! `EngineEvent`s.
//!
//! # Usage
//!
//! ```ignore
//! use siftbox::{events, EngineConfig, MemoryStore, SearchSession, StaticProvider};
//!
//! let (tx, mut rx) = events::channel();
//! let session = Arc::new(SearchSession::new(
//!     EngineConfig::default(),
//!     Arc::new(StaticProvider::new(records)),
//!     Arc::new(MemoryStore::new()),
//!     tx,
//! ));
//! let (controller, settled) = session.controller();
//! tokio::spawn(Arc::clone(&session).run(settled));
//!
//! controller.set_raw_query("revenue");
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
mod index;
pub mod mutate;
pub mod provider;
pub mod search;
pub mod session;
pub mod store;
mod types;
mod utils;

#[doc(hidden)]
pub mod testing;

// Re-exports for public API
pub use aggregate::{
    build_trend, build_trend_by, group_by, group_by_keys, percentage, summarize,
    AggregationBucket, Direction, MetricGoal, Polarity, Trend, TrendPoint,
};
pub use config::{EngineConfig, FilterMode};
pub use error::{
    AggregationError, ConfigError, EngineError, MutationError, ProviderError, RemoteError,
};
pub use events::{EngineEvent, EventReceiver, EventSender};
pub use filter::{facet_values, EffectiveQuery, FacetSelection, FilterComposer};
pub use index::{RecordIndex, SharedIndex};
pub use mutate::{MutationAttempt, OptimisticMutator, PendingMutation};
pub use provider::{DataProvider, StaticProvider};
pub use search::{SearchController, SearchHistoryStore, SettledQueries};
pub use session::{FetchOutcome, IssuedFetch, SearchSession};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{FieldValue, Patch, Record, Scalar};
pub use utils::normalize;
