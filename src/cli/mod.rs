// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the siftbox command-line interface.
//!
//! Four subcommands exercise the engine against JSON fixtures: `search` runs a
//! query with facets through a session (and remembers it), `rollup` groups a
//! collection, `trend` validates a series, and `history` shows or clears what
//! `search` remembered.

pub mod display;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "siftbox",
    about = "Search, facet and roll up catalog records",
    version
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit JSON instead of formatted tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter a JSON array of records by query and facets
    Search {
        /// JSON file containing an array of records
        #[arg(short, long)]
        data: PathBuf,

        /// Engine config (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Free-text query
        #[arg(short, long, default_value = "")]
        query: String,

        /// Facet selection as name=value[,value...]; repeatable
        #[arg(short, long = "facet", value_name = "NAME=VALUES")]
        facets: Vec<String>,

        /// Fields to search (overrides config)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Where to persist search history
        #[arg(long, default_value = ".siftbox/state.json")]
        state: PathBuf,

        /// Maximum number of results to display
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Group records by a field and report how many match a condition
    Rollup {
        /// JSON file containing an array of records
        #[arg(short, long)]
        data: PathBuf,

        /// Field to group by
        #[arg(short, long)]
        by: String,

        /// Condition as field=value; records without it count as unmatched
        #[arg(short, long = "match", value_name = "FIELD=VALUE")]
        matches: String,

        /// Declared keys that should appear even with no records
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
    },

    /// Validate a trend series and report its direction
    Trend {
        /// JSON file containing an array of {label, value}
        #[arg(short, long)]
        points: PathBuf,

        /// Which way is better for this metric
        #[arg(long, value_enum, default_value = "higher")]
        polarity: PolarityArg,

        /// Optional target to compare the last value against
        #[arg(long)]
        target: Option<f64>,
    },

    /// Show or clear remembered searches
    History {
        /// State file used by `search`
        #[arg(long, default_value = ".siftbox/state.json")]
        state: PathBuf,

        /// Engine config (for the history key and limit)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Forget all remembered searches
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolarityArg {
    Higher,
    Lower,
}

/// Split `name=a,b,c` into the name and its values.
pub fn parse_assignment(raw: &str) -> Option<(String, Vec<String>)> {
    let (name, values) = raw.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Some((name.to_string(), values))
}
