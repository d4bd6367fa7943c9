// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! The live record collection.
//!
//! Order is whatever the provider returned, and it is never re-sorted here.
//! Filtering is stable: `query` yields matches in collection order.
//!
//! Records with an optimistic write in flight are tracked here too, so that a
//! refresh landing mid-write cannot lose the write or its rollback point.
//!
//! **Invariants**:
//! - ids are unique
//! - `positions[id] == i` iff `records[i].id == id`
//! - for every pending id still indexed, the stored record is the pending
//!   write's `base` with its patch applied

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Patch, Record};

/// The index as shared between the session and the mutator.
///
/// Locks are short: take, read or write, release. Never hold one across `.await`.
pub type SharedIndex = Arc<RwLock<RecordIndex>>;

/// An optimistic write awaiting its remote answer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingWrite {
    pub(crate) patch: Patch,
    /// Last confirmed server copy; what a rollback restores.
    pub(crate) base: Record,
}

/// In-memory snapshot of the current item collection.
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    records: Vec<Record>,
    positions: HashMap<String, usize>,
    pending: HashMap<String, PendingWrite>,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a collection (same rules as `replace`).
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut index = Self::new();
        index.replace(records);
        index
    }

    /// Wrap in the shared handle.
    pub fn shared(self) -> SharedIndex {
        Arc::new(RwLock::new(self))
    }

    /// Swap in a whole new collection.
    ///
    /// A duplicated id keeps the position of its first occurrence and the
    /// contents of its last. A record with a write in flight becomes that
    /// write's new base and is stored with the patch re-applied.
    pub fn replace(&mut self, records: Vec<Record>) {
        self.records.clear();
        self.positions.clear();
        for record in records {
            self.upsert(record);
        }
        for (id, write) in &mut self.pending {
            if let Some(&position) = self.positions.get(id) {
                write.base = self.records[position].clone();
                self.records[position] = write.base.patched(&write.patch);
            }
        }
    }

    /// Is an optimistic write to `id` waiting on the remote?
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Apply `patch` to `id` and mark it pending.
    ///
    /// Returns the record as it was, or `None` if `id` is not indexed. The
    /// caller checks `is_pending` first.
    pub(crate) fn stage(&mut self, id: &str, patch: &Patch) -> Option<Record> {
        let &position = self.positions.get(id)?;
        let base = self.records[position].clone();
        self.records[position] = base.patched(patch);
        self.pending.insert(
            id.to_string(),
            PendingWrite {
                patch: patch.clone(),
                base: base.clone(),
            },
        );
        Some(base)
    }

    /// Stop tracking the write to `id`.
    pub(crate) fn finish(&mut self, id: &str) -> Option<PendingWrite> {
        self.pending.remove(id)
    }

    /// Replace a record in place, or append it if the id is new.
    pub fn upsert(&mut self, record: Record) {
        match self.positions.get(&record.id) {
            Some(&position) => self.records[position] = record,
            None => {
                self.positions.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Remove a record, keeping the relative order of the rest.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Record> {
        let position = self.positions.remove(id)?;
        let removed = self.records.remove(position);
        for record in &self.records[position..] {
            if let Some(p) = self.positions.get_mut(&record.id) {
                *p -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.positions.get(id).map(|&p| &self.records[p])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Matching records, in collection order.
    pub fn query<P>(&self, predicate: P) -> Vec<Record>
    where
        P: Fn(&Record) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).cloned().collect()
    }

    /// All records, in collection order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
