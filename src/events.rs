// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! What the engine tells the page.
//!
//! Pages subscribe to one channel of `EngineEvent`s instead of registering a
//! callback per concern. A dropped receiver is not an error: the page went away
//! and nobody is listening, so sends are silently discarded.

use tokio::sync::mpsc;
use tracing::trace;

use crate::aggregate::{AggregationBucket, Trend};
use crate::error::{MutationError, ProviderError};
use crate::types::Record;

/// Notifications published by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The search box settled on a new value.
    SettledQuery(String),
    /// The visible result set changed.
    ResultsChanged(Vec<Record>),
    /// A group-by rollup finished.
    AggregationReady(Vec<AggregationBucket>),
    /// A trend series was built.
    TrendReady(Trend),
    /// An optimistic write was rolled back.
    MutationFailed {
        record_id: String,
        error: MutationError,
    },
    /// The latest fetch failed; the previous results are still shown.
    FetchFailed { error: ProviderError },
}

/// Receiving half handed to the page.
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Sending half shared by engine components.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl EventSender {
    /// A sender whose events go nowhere.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                trace!("event receiver dropped, discarding event");
            }
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx: Some(tx) }, rx)
}
