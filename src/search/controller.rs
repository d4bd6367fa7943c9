// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Debounced search input.
//!
//! Every keystroke updates `raw` immediately and restarts a timer. Only when the
//! timer survives a full delay without another keystroke does `settled` catch
//! up, and only then is a notification sent. A burst of typing produces exactly
//! one notification carrying the last value.
//!
//! Cancellation is belt and braces: the previous timer task is aborted, and each
//! task also carries the generation it was started for. A task that wakes after
//! a newer keystroke bumped the generation does nothing, even if the abort
//! arrived too late to stop it.
//!
//! **Invariant**: `settled` is only ever assigned a value `raw` held for at least
//! `delay`, or `""` via `clear_immediately`.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::events::{EngineEvent, EventSender};

/// Default debounce delay used by most catalog pages.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct ControllerState {
    raw: String,
    settled: String,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

/// Owns the raw and settled query text of one search box.
#[derive(Debug)]
pub struct SearchController {
    delay: Duration,
    state: Arc<Mutex<ControllerState>>,
    tx: mpsc::UnboundedSender<String>,
    events: EventSender,
}

/// Stream of settled query values, in the order their timers fired.
#[derive(Debug)]
pub struct SettledQueries {
    rx: mpsc::UnboundedReceiver<String>,
}

impl SettledQueries {
    /// Wait for the next settled value. `None` once the controller is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Take a settled value if one is already queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl SearchController {
    /// Create a controller with the given debounce delay.
    pub fn new(delay: Duration) -> (Self, SettledQueries) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            delay,
            state: Arc::new(Mutex::new(ControllerState::default())),
            tx,
            events: EventSender::disconnected(),
        };
        (controller, SettledQueries { rx })
    }

    /// Also publish `EngineEvent::SettledQuery` on the given sender.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The text as typed, updated on every call to `set_raw_query`.
    pub fn raw(&self) -> String {
        self.state.lock().raw.clone()
    }

    /// The last value that survived the debounce window.
    pub fn settled(&self) -> String {
        self.state.lock().settled.clone()
    }

    /// Is a debounce timer currently running?
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Record a keystroke and restart the debounce timer.
    ///
    /// Must be called from inside a tokio runtime. Clearing the box with `""`
    /// goes through the same delay; use `clear_immediately` to bypass it.
    pub fn set_raw_query(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.state.lock();
        state.raw = text;
        state.generation += 1;
        let generation = state.generation;

        if let Some(previous) = state.pending.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.state);
        let tx = self.tx.clone();
        let events = self.events.clone();
        let delay = self.delay;

        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let value = {
                let mut state = shared.lock();
                if state.generation != generation {
                    trace!(generation, "debounce timer superseded");
                    return;
                }
                state.pending = None;
                if state.settled == state.raw {
                    trace!(query = %state.raw, "query unchanged, no settle");
                    return;
                }
                state.settled = state.raw.clone();
                state.settled.clone()
            };

            debug!(query = %value, "query settled");
            events.emit(EngineEvent::SettledQuery(value.clone()));
            let _ = tx.send(value);
        }));
    }

    /// Cancel any pending timer and settle on `""` right now.
    ///
    /// A notification is sent only if `settled` was not already empty.
    pub fn clear_immediately(&self) {
        let changed = {
            let mut state = self.state.lock();
            state.generation += 1;
            if let Some(previous) = state.pending.take() {
                previous.abort();
            }
            state.raw.clear();
            let changed = !state.settled.is_empty();
            state.settled.clear();
            changed
        };

        if changed {
            debug!("query cleared immediately");
            self.events.emit(EngineEvent::SettledQuery(String::new()));
            let _ = self.tx.send(String::new());
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(pending) = self.state.lock().pending.take() {
            pending.abort();
        }
    }
}
