// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Trend series and metric direction.
//!
//! A trend is whatever sequence of periods the caller hands over, in the order
//! they handed it over. `build_trend` is the seam where a real time-series
//! source can be swapped in later; today it validates and passes through.
//!
//! Whether "up" is good is declared by the caller through `Polarity`. Some
//! metrics (time-to-access, redundancy rate) improve as they fall, and that is
//! a property of the metric, not something to guess from its display name.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AggregationError;

/// One period's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    pub value: f64,
}

impl TrendPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Which way is better for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

/// Movement of a trend from its first to its last point, judged by polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Improving,
    Declining,
    Flat,
}

/// A target value and which side of it counts as good.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricGoal {
    pub target: f64,
    #[serde(default)]
    pub polarity: Polarity,
}

impl MetricGoal {
    pub fn new(target: f64, polarity: Polarity) -> Self {
        Self { target, polarity }
    }

    /// Is `value` on the good side of the target (inclusive)?
    pub fn is_met(&self, value: f64) -> bool {
        match self.polarity {
            Polarity::HigherIsBetter => value >= self.target,
            Polarity::LowerIsBetter => value <= self.target,
        }
    }
}

/// A validated, caller-ordered series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trend {
    points: Vec<TrendPoint>,
}

impl Trend {
    pub fn points(&self) -> &[TrendPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrendPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrendPoint> {
        self.points.last()
    }

    /// Last value minus first value. Zero for fewer than two points.
    pub fn delta(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.value - first.value,
            _ => 0.0,
        }
    }

    /// Whether the series moved in the good direction overall.
    pub fn direction(&self, polarity: Polarity) -> Direction {
        let delta = self.delta();
        if delta == 0.0 {
            return Direction::Flat;
        }
        let rising = delta > 0.0;
        match (polarity, rising) {
            (Polarity::HigherIsBetter, true) | (Polarity::LowerIsBetter, false) => Direction::Improving,
            _ => Direction::Declining,
        }
    }

    pub fn into_points(self) -> Vec<TrendPoint> {
        self.points
    }
}

/// Validate a caller-ordered series and pass it through unchanged.
///
/// Labels must be unique (a repeated period means the ordering is not
/// monotonic) and values finite. The order is never changed.
pub fn build_trend(points: Vec<TrendPoint>) -> Result<Trend, AggregationError> {
    validate_points(&points)?;
    Ok(Trend { points })
}

fn validate_points(points: &[TrendPoint]) -> Result<(), AggregationError> {
    let mut seen = HashSet::with_capacity(points.len());
    for (position, point) in points.iter().enumerate() {
        if !point.value.is_finite() {
            return Err(AggregationError::NonFiniteValue {
                label: point.label.clone(),
                value: point.value,
            });
        }
        if !seen.insert(point.label.as_str()) {
            return Err(AggregationError::DuplicateLabel {
                label: point.label.clone(),
                position,
            });
        }
    }
    Ok(())
}

/// `build_trend`, plus a check that `ordinal` strictly increases along the series.
///
/// Use when periods carry a sortable key (month number, ISO date). The series
/// is still not sorted; an out-of-order point is an error.
pub fn build_trend_by<K, F>(points: Vec<TrendPoint>, ordinal: F) -> Result<Trend, AggregationError>
where
    K: PartialOrd,
    F: Fn(&TrendPoint) -> K,
{
    for (position, pair) in points.windows(2).enumerate() {
        if ordinal(&pair[0]).partial_cmp(&ordinal(&pair[1])) != Some(std::cmp::Ordering::Less) {
            return Err(AggregationError::OutOfOrder {
                label: pair[1].label.clone(),
                position: position + 1,
            });
        }
    }
    build_trend(points)
}
