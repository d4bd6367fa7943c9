// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! Facet selections and the effective predicate.
//!
//! The rules are small but easy to get subtly wrong, which is why every page
//! used to get them slightly differently:
//!
//! - facets AND together; values within a facet OR together
//! - an empty selection means "no filter on this facet"
//! - a record missing an active facet's field does **not** match
//! - list-valued fields match when any element is selected
//! - the text query is a case- and accent-insensitive substring test, OR'd
//!   across the searchable fields

mod composer;
mod predicate;

pub use composer::{facet_values, FilterComposer};
pub use predicate::{EffectiveQuery, FacetSelection};
