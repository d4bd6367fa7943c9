// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Group-by rollups: "how many in each domain, and how many of those comply".
//!
//! Buckets come out in first-seen key order. Nothing is sorted and nothing is
//! cached; the same input always yields the same output.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One group's counts.
///
/// **Invariant**: `matched <= total`, and `percentage == percentage(matched, total)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    pub key: String,
    pub matched: usize,
    pub total: usize,
    pub percentage: u32,
}

impl AggregationBucket {
    /// `matched` above `total` is clamped to `total`.
    pub fn new(key: impl Into<String>, matched: usize, total: usize) -> Self {
        let matched = matched.min(total);
        Self {
            key: key.into(),
            matched,
            total,
            percentage: percentage(matched, total),
        }
    }
}

/// `matched / total * 100`, rounded half-up to an integer. Zero when `total`
/// is zero; `matched` is clamped to `total`, so the result never exceeds 100.
///
/// Integer arithmetic throughout, so 1/8 (12.5%) rounds to 13 exactly rather
/// than depending on how 12.5 happens to be represented.
pub fn percentage(matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let matched = matched.min(total) as u128;
    let total = total as u128;
    ((matched * 200 + total) / (total * 2)) as u32
}

/// Tally records by key, preserving first-seen key order.
struct Tally {
    buckets: Vec<(String, usize, usize)>,
    slots: HashMap<String, usize>,
}

impl Tally {
    fn new() -> Self {
        Self {
            buckets: Vec::new(),
            slots: HashMap::new(),
        }
    }

    fn slot(&mut self, key: String) -> usize {
        if let Some(&slot) = self.slots.get(&key) {
            return slot;
        }
        let slot = self.buckets.len();
        self.slots.insert(key.clone(), slot);
        self.buckets.push((key, 0, 0));
        slot
    }

    fn add(&mut self, key: String, matched: bool) {
        let slot = self.slot(key);
        let bucket = &mut self.buckets[slot];
        bucket.2 += 1;
        if matched {
            bucket.1 += 1;
        }
    }

    fn finish(self) -> Vec<AggregationBucket> {
        self.buckets
            .into_iter()
            .map(|(key, matched, total)| AggregationBucket::new(key, matched, total))
            .collect()
    }
}

/// One bucket per distinct key, in first-seen order.
///
/// `total` counts records with the key; `matched` counts those that also pass
/// `match_fn`.
pub fn group_by<R, K, F, M>(records: &[R], key_fn: F, match_fn: M) -> Vec<AggregationBucket>
where
    K: Into<String>,
    F: Fn(&R) -> K,
    M: Fn(&R) -> bool,
{
    let mut tally = Tally::new();
    for record in records {
        tally.add(key_fn(record).into(), match_fn(record));
    }
    tally.finish()
}

/// Like `group_by`, but every key in `keys` gets a bucket even with no records.
///
/// Declared keys come first in the order given; keys found only in the data
/// follow in first-seen order. An empty declared key reports `{0, 0, 0}`.
pub fn group_by_keys<R, K, F, M, I, S>(
    keys: I,
    records: &[R],
    key_fn: F,
    match_fn: M,
) -> Vec<AggregationBucket>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    K: Into<String>,
    F: Fn(&R) -> K,
    M: Fn(&R) -> bool,
{
    let mut tally = Tally::new();
    for key in keys {
        tally.slot(key.into());
    }
    for record in records {
        tally.add(key_fn(record).into(), match_fn(record));
    }
    tally.finish()
}

/// A single bucket over the whole collection, keyed `"all"`.
pub fn summarize<R, M>(records: &[R], match_fn: M) -> AggregationBucket
where
    M: Fn(&R) -> bool,
{
    let matched = records.iter().filter(|r| match_fn(r)).count();
    AggregationBucket::new("all", matched, records.len())
}
