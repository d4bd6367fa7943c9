// Copyright 2025-present the siftbox contributors
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use siftbox::{
    build_trend, events, group_by, group_by_keys, AggregationBucket, EngineConfig, FileStore,
    KeyValueStore, MetricGoal, Polarity, Record, SearchHistoryStore, SearchSession,
    StaticProvider, TrendPoint,
};

mod cli;
use cli::display::{self, muted, pad_left, pad_right, row, section_bot, section_top, truncate};
use cli::{parse_assignment, Cli, Commands, PolarityArg};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match cli.command {
        Commands::Search {
            data,
            config,
            query,
            facets,
            fields,
            state,
            limit,
        } => {
            let mut config = load_config(config.as_deref())?;
            if !fields.is_empty() {
                config.searchable_fields = fields;
                config.validate()?;
            }
            let records = load_records(&data)?;
            runtime.block_on(run_search(
                config, records, &query, &facets, &state, limit, cli.json,
            ))
        }
        Commands::Rollup {
            data,
            by,
            matches,
            keys,
        } => run_rollup(&data, &by, &matches, keys, cli.json),
        Commands::Trend {
            points,
            polarity,
            target,
        } => run_trend(&points, polarity, target, cli.json),
        Commands::History {
            state,
            config,
            clear,
        } => run_history(&state, config.as_deref(), clear, cli.json),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install log subscriber")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of records", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// search
// =============================================================================

async fn run_search(
    config: EngineConfig,
    records: Vec<Record>,
    query: &str,
    facets: &[String],
    state: &Path,
    limit: usize,
    json: bool,
) -> Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(state));
    let provider = Arc::new(StaticProvider::unfiltered(records));
    let (events, _rx) = events::channel();
    let session = SearchSession::new(config, provider, store, events);

    for facet in facets {
        let Some((name, values)) = parse_assignment(facet) else {
            bail!("facet `{}` is not NAME=VALUES", facet);
        };
        session.set_facet(&name, values).await?;
    }
    session.apply_settled(query).await?;

    let results = session.results();
    if json {
        return print_json(&results);
    }

    let label = if query.trim().is_empty() {
        format!("RESULTS ({})", results.len())
    } else {
        format!("RESULTS FOR \"{}\" ({})", query.trim(), results.len())
    };
    section_top(&label);
    if results.is_empty() {
        row(&muted("no matching records"));
    }
    for record in results.iter().take(limit) {
        row(&record_line(record));
    }
    if results.len() > limit {
        row(&muted(&format!("… {} more", results.len() - limit)));
    }
    section_bot();

    let history = session.history();
    if !history.is_empty() {
        println!("{}", muted(&format!("recent: {}", history.join(" · "))));
    }
    Ok(())
}

fn record_line(record: &Record) -> String {
    let name = record
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let extras: Vec<String> = record
        .fields
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "name" | "description"))
        .take(3)
        .map(|(k, v)| {
            let text: Vec<String> = v.scalars().map(|s| s.as_text()).collect();
            format!("{}={}", k, text.join(","))
        })
        .collect();
    format!(
        "{} {} {}",
        pad_right(&record.id, 10),
        pad_right(&truncate(name, 28), 28),
        muted(&truncate(&extras.join(" "), 30))
    )
}

// =============================================================================
// rollup
// =============================================================================

fn run_rollup(
    data: &Path,
    by: &str,
    condition: &str,
    keys: Vec<String>,
    json: bool,
) -> Result<()> {
    let records = load_records(data)?;
    let Some((field, wanted)) = parse_assignment(condition) else {
        bail!("condition `{}` is not FIELD=VALUE", condition);
    };

    let key_fn = |r: &Record| {
        r.get(by)
            .and_then(|v| v.scalars().next().map(|s| s.as_text()))
            .unwrap_or_else(|| "(none)".to_string())
    };
    let match_fn = |r: &Record| {
        r.get(&field)
            .map(|v| v.scalars().any(|s| wanted.contains(&s.as_text())))
            .unwrap_or(false)
    };

    let buckets = if keys.is_empty() {
        group_by(&records, key_fn, match_fn)
    } else {
        group_by_keys(keys, &records, key_fn, match_fn)
    };

    if json {
        return print_json(&buckets);
    }
    section_top(&format!("{} BY {}", condition.to_uppercase(), by.to_uppercase()));
    for bucket in &buckets {
        row(&bucket_line(bucket));
    }
    section_bot();
    Ok(())
}

fn bucket_line(bucket: &AggregationBucket) -> String {
    format!(
        "{} {} {} {}",
        pad_right(&truncate(&bucket.key, 24), 24),
        pad_left(&format!("{}/{}", bucket.matched, bucket.total), 9),
        display::percentage_colored(bucket.percentage),
        display::bar(bucket.percentage)
    )
}

// =============================================================================
// trend
// =============================================================================

fn run_trend(path: &Path, polarity: PolarityArg, target: Option<f64>, json: bool) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let points: Vec<TrendPoint> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of points", path.display()))?;
    let trend = build_trend(points)?;

    let polarity = match polarity {
        PolarityArg::Higher => Polarity::HigherIsBetter,
        PolarityArg::Lower => Polarity::LowerIsBetter,
    };
    let direction = trend.direction(polarity);
    let goal_met = match (target, trend.last()) {
        (Some(target), Some(last)) => Some(MetricGoal::new(target, polarity).is_met(last.value)),
        _ => None,
    };

    if json {
        return print_json(&serde_json::json!({
            "points": trend.points(),
            "direction": direction,
            "delta": trend.delta(),
            "goalMet": goal_met,
        }));
    }

    section_top(&format!("TREND ({} points)", trend.len()));
    for point in trend.points() {
        row(&format!(
            "{} {}",
            pad_right(&truncate(&point.label, 20), 20),
            pad_left(&format!("{:.2}", point.value), 12)
        ));
    }
    section_bot();
    println!("{}  Δ {:+.2}", display::direction_label(direction), trend.delta());
    if let (Some(target), Some(met)) = (target, goal_met) {
        let verdict = if met { "met" } else { "missed" };
        println!("target {:.2}: {}", target, verdict);
    }
    Ok(())
}

// =============================================================================
// history
// =============================================================================

fn run_history(state: &Path, config: Option<&Path>, clear: bool, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let mut history =
        SearchHistoryStore::new(FileStore::open(state), config.history_key, config.history_limit);
    history.load();

    if clear {
        history.clear();
        println!("{}", muted("search history cleared"));
        return Ok(());
    }
    if json {
        return print_json(&history.list());
    }

    section_top("RECENT SEARCHES");
    if history.is_empty() {
        row(&muted("nothing yet"));
    }
    for (i, query) in history.list().iter().enumerate() {
        row(&format!("{} {}", muted(&format!("{}.", i + 1)), query));
    }
    section_bot();
    Ok(())
}
