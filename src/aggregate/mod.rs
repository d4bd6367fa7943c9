// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Rollups and trend series: the numbers on top of the list.
//!
//! Pure functions over a slice. The engine runs them over whatever collection
//! the caller picks, usually the unfiltered snapshot, and never keeps results
//! between calls.

mod rollup;
mod trend;

pub use rollup::{group_by, group_by_keys, percentage, summarize, AggregationBucket};
pub use trend::{build_trend, build_trend_by, Direction, MetricGoal, Polarity, Trend, TrendPoint};
