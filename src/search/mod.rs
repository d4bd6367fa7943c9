// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! The search box: debounced input and the history of what was searched.

pub mod controller;
pub mod history;

pub use controller::{SearchController, SettledQueries, DEFAULT_DEBOUNCE};
pub use history::{SearchHistoryStore, DEFAULT_HISTORY_KEY, DEFAULT_HISTORY_LIMIT};
