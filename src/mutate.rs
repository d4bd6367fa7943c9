// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Optimistic writes with rollback.
//!
//! Snapshot, apply locally, call the remote, restore the snapshot if the remote
//! says no. The local write happens before `mutate` returns, so the page shows
//! the change before any network round-trip.
//!
//! A record has at most one write in flight. Rollback needs a well-defined
//! "previous" state, and two overlapping writes would each hold a different
//! one. The second caller gets `ConcurrentMutation` immediately instead.
//!
//! The pending write lives in the `RecordIndex`. A refresh that lands while the
//! remote is busy becomes the write's new base, and the patch is re-applied on
//! top of it, so a rollback restores the latest confirmed record and a success
//! keeps the patch visible.
//!
//! **Invariant**: while a `PendingMutation` for `id` exists, `id` is pending in
//! the index. When it completes or is dropped, `id` stops being pending and the
//! index holds either the confirmed value or the last confirmed base.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::{MutationError, RemoteError};
use crate::events::{EngineEvent, EventSender};
use crate::index::SharedIndex;
use crate::types::{Patch, Record};

/// One optimistic write, from local apply to remote answer.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationAttempt {
    pub record_id: String,
    pub patch: Patch,
    /// The record as it was when the write was applied.
    pub previous_snapshot: Record,
}

/// Applies local writes ahead of their remote confirmation.
///
/// Clones, and any other mutator over the same index, see the same pending
/// writes.
#[derive(Debug, Clone)]
pub struct OptimisticMutator {
    index: SharedIndex,
    events: EventSender,
    reconcile: bool,
}

impl OptimisticMutator {
    pub fn new(index: SharedIndex, events: EventSender) -> Self {
        Self {
            index,
            events,
            reconcile: true,
        }
    }

    /// Whether to replace the optimistic record with the one the server returns.
    pub fn reconcile_with_server(mut self, reconcile: bool) -> Self {
        self.reconcile = reconcile;
        self
    }

    /// Is a write for `record_id` waiting on the remote?
    pub fn is_pending(&self, record_id: &str) -> bool {
        self.index.read().is_pending(record_id)
    }

    /// Apply `patch` locally now and prepare the remote call.
    ///
    /// Returns once the index holds the patched record. Call `settle` on the
    /// result to run `remote` and resolve the write.
    pub fn mutate<F, Fut>(
        &self,
        record_id: &str,
        patch: Patch,
        remote: F,
    ) -> Result<PendingMutation<Fut>, MutationError>
    where
        F: FnOnce(String, Patch) -> Fut,
        Fut: Future<Output = Result<Record, RemoteError>>,
    {
        let previous_snapshot = {
            let mut index = self.index.write();
            if index.is_pending(record_id) {
                debug!(record_id, "rejecting concurrent mutation");
                return Err(MutationError::ConcurrentMutation {
                    record_id: record_id.to_string(),
                });
            }
            index
                .stage(record_id, &patch)
                .ok_or_else(|| MutationError::UnknownRecord {
                    record_id: record_id.to_string(),
                })?
        };

        debug!(record_id, fields = patch.fields.len(), "optimistic write applied");

        let future = remote(record_id.to_string(), patch.clone());
        Ok(PendingMutation {
            future,
            guard: InFlightGuard {
                attempt: MutationAttempt {
                    record_id: record_id.to_string(),
                    patch,
                    previous_snapshot,
                },
                resolved: false,
                index: self.index.clone(),
                events: self.events.clone(),
                reconcile: self.reconcile,
            },
        })
    }
}

/// A write applied locally and waiting for the remote.
///
/// Dropping it unsettled rolls the record back.
#[must_use = "an unsettled mutation is rolled back when dropped"]
pub struct PendingMutation<Fut> {
    future: Fut,
    guard: InFlightGuard,
}

impl<Fut> PendingMutation<Fut>
where
    Fut: Future<Output = Result<Record, RemoteError>>,
{
    /// The attempt being resolved.
    pub fn attempt(&self) -> &MutationAttempt {
        &self.guard.attempt
    }

    /// Run the remote call and resolve the write.
    ///
    /// On success returns the server's record, carrying the id that was
    /// written. On failure the last confirmed record is back in the index,
    /// `MutationFailed` has been published, and the error carries that record.
    pub async fn settle(self) -> Result<Record, MutationError> {
        let PendingMutation { future, mut guard } = self;
        match future.await {
            Ok(confirmed) => Ok(guard.commit(confirmed)),
            Err(source) => {
                let restored = guard.rollback();
                let error = MutationError::RemoteFailure {
                    record_id: guard.attempt.record_id.clone(),
                    restored: Box::new(restored),
                    source,
                };
                guard.publish_failure(&error);
                Err(error)
            }
        }
    }
}

struct InFlightGuard {
    attempt: MutationAttempt,
    resolved: bool,
    index: SharedIndex,
    events: EventSender,
    reconcile: bool,
}

impl InFlightGuard {
    fn commit(&mut self, mut confirmed: Record) -> Record {
        self.resolved = true;
        let record_id = &self.attempt.record_id;
        if confirmed.id != *record_id {
            warn!(
                record_id = %record_id,
                returned = %confirmed.id,
                "remote answered with another id, keeping the written one"
            );
            confirmed.id = record_id.clone();
        }

        let mut index = self.index.write();
        index.finish(record_id);
        if self.reconcile && index.contains(record_id) {
            index.upsert(confirmed.clone());
        }
        debug!(record_id = %record_id, "optimistic write confirmed");
        confirmed
    }

    /// Put the last confirmed record back and return it.
    ///
    /// A record a refresh has since removed stays removed; putting it back
    /// would resurrect it.
    fn rollback(&mut self) -> Record {
        self.resolved = true;
        let record_id = &self.attempt.record_id;
        let mut index = self.index.write();
        let restored = index
            .finish(record_id)
            .map(|write| write.base)
            .unwrap_or_else(|| self.attempt.previous_snapshot.clone());
        if index.contains(record_id) {
            index.upsert(restored.clone());
            warn!(record_id = %record_id, "optimistic write rolled back");
        } else {
            warn!(record_id = %record_id, "rollback skipped, record no longer indexed");
        }
        restored
    }

    fn publish_failure(&self, error: &MutationError) {
        self.events.emit(EngineEvent::MutationFailed {
            record_id: error.record_id().to_string(),
            error: error.clone(),
        });
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.resolved {
            self.rollback();
            self.publish_failure(&MutationError::Abandoned {
                record_id: self.attempt.record_id.clone(),
            });
        }
    }
}
