// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types, one enum per concern.
//!
//! Not everything that goes wrong is an error here. A stale fetch response is a
//! normal outcome (`FetchOutcome::Stale`), and unreadable persisted history is
//! logged and treated as empty. What remains are the failures a caller has to
//! act on.

use thiserror::Error;

use crate::types::Record;

/// Failure reported by a `DataProvider`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport or backend failure. Retrying may succeed.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered but the payload could not be decoded.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Failure reported by a remote mutation call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the search session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A fetch for the latest query failed. The index still holds the last
    /// good snapshot, so the caller can show it alongside a retry affordance.
    #[error("fetch failed (retryable): {0}")]
    TransientFetch(#[source] ProviderError),
}

/// Errors surfaced by the optimistic mutator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MutationError {
    /// Another write for this record has not settled yet. Nothing changed.
    #[error("record '{record_id}' already has a mutation in flight")]
    ConcurrentMutation { record_id: String },

    /// The record is not in the index, so there is nothing to snapshot.
    #[error("record '{record_id}' is not in the index")]
    UnknownRecord { record_id: String },

    /// The remote write failed and the local record was rolled back.
    ///
    /// `restored` is the record as it now sits in the index.
    #[error("remote mutation of '{record_id}' failed: {source}")]
    RemoteFailure {
        record_id: String,
        restored: Box<Record>,
        #[source]
        source: RemoteError,
    },

    /// The pending write was dropped before the remote call finished.
    #[error("mutation of '{record_id}' was abandoned and rolled back")]
    Abandoned { record_id: String },
}

impl MutationError {
    /// The record this error is about.
    pub fn record_id(&self) -> &str {
        match self {
            MutationError::ConcurrentMutation { record_id }
            | MutationError::UnknownRecord { record_id }
            | MutationError::RemoteFailure { record_id, .. }
            | MutationError::Abandoned { record_id } => record_id,
        }
    }
}

/// Trend series validation failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AggregationError {
    /// The same period label appears twice.
    #[error("trend label '{label}' appears more than once (position {position})")]
    DuplicateLabel { label: String, position: usize },

    /// A trend value is NaN or infinite.
    #[error("trend value at '{label}' is not finite: {value}")]
    NonFiniteValue { label: String, value: f64 },

    /// Caller-supplied ordinals are not strictly increasing.
    #[error("trend point '{label}' at position {position} is out of order")]
    OutOfOrder { label: String, position: usize },
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
