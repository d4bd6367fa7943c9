//! Shared test utilities and fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use siftbox::{
    events, DataProvider, EffectiveQuery, EngineConfig, EngineEvent, EventReceiver, MemoryStore,
    ProviderError, Record, SearchSession,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Re-export canonical test utilities from siftbox::testing
pub use siftbox::testing::{make_record, make_tagged, sample_catalog};

// ============================================================================
// SCRIPTED PROVIDER
// ============================================================================

/// What the provider does for one query text.
#[derive(Clone)]
pub struct Script {
    pub delay: Duration,
    pub response: Result<Vec<Record>, ProviderError>,
}

/// A provider whose latency and answer are chosen per query.
///
/// Unscripted queries return `fallback` immediately. Every fetch is logged so
/// tests can assert what was asked for and in which order.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, Script>>,
    fallback: Vec<Record>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(fallback: Vec<Record>) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    pub fn respond(self, query: &str, delay_ms: u64, records: Vec<Record>) -> Self {
        self.scripts.lock().insert(
            query.to_string(),
            Script {
                delay: Duration::from_millis(delay_ms),
                response: Ok(records),
            },
        );
        self
    }

    pub fn fail(self, query: &str, delay_ms: u64) -> Self {
        self.scripts.lock().insert(
            query.to_string(),
            Script {
                delay: Duration::from_millis(delay_ms),
                response: Err(ProviderError::Unavailable(format!("{} timed out", query))),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl DataProvider for ScriptedProvider {
    async fn fetch(&self, query: &EffectiveQuery) -> Result<Vec<Record>, ProviderError> {
        self.calls.lock().push(query.query().to_string());
        let script = self.scripts.lock().get(query.query()).cloned();
        match script {
            Some(script) => {
                tokio::time::sleep(script.delay).await;
                script.response
            }
            None => Ok(self.fallback.clone()),
        }
    }
}

// ============================================================================
// SESSIONS
// ============================================================================

/// A session over `provider` with in-memory history and a live event channel.
pub fn session_with(
    config: EngineConfig,
    provider: Arc<dyn DataProvider>,
) -> (Arc<SearchSession>, EventReceiver) {
    let (tx, rx) = events::channel();
    let session = SearchSession::new(config, provider, Arc::new(MemoryStore::new()), tx);
    (Arc::new(session), rx)
}

/// Drain everything currently queued on an event receiver.
pub fn drain(rx: &mut EventReceiver) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

/// Ids of a result list, in order.
pub fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}
