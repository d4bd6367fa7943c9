//! Keystrokes to results: controller, session, composer and history together.

use std::sync::Arc;
use std::time::Duration;

use siftbox::{
    EngineConfig, EngineEvent, FetchOutcome, MemoryStore, Record, SearchHistoryStore,
    SearchSession, StaticProvider, TrendPoint,
};

use crate::common::{drain, ids, sample_catalog, session_with, ScriptedProvider};

fn settled_queries(events: &[EngineEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::SettledQuery(q) => Some(q.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn typing_burst_fetches_once_for_final_text() {
    let provider = Arc::new(ScriptedProvider::new(sample_catalog()));
    let (session, mut rx) = session_with(EngineConfig::default(), provider.clone());
    let (controller, settled) = session.controller();
    let driver = tokio::spawn(Arc::clone(&session).run(settled));

    controller.set_raw_query("r");
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.set_raw_query("rev");
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.set_raw_query("revenue");
    tokio::time::sleep(Duration::from_millis(700)).await;

    assert_eq!(provider.calls(), vec!["revenue"]);
    assert_eq!(ids(&session.results()), vec!["a01"]);
    assert_eq!(session.history(), vec!["revenue"]);

    let events = drain(&mut rx);
    assert_eq!(settled_queries(&events), vec!["revenue"]);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ResultsChanged(r) if r.len() == 1)));

    drop(controller);
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn clearing_settles_immediately_and_shows_everything() {
    let provider = Arc::new(ScriptedProvider::new(sample_catalog()));
    let (session, mut rx) = session_with(EngineConfig::default(), provider);
    let (controller, settled) = session.controller();
    tokio::spawn(Arc::clone(&session).run(settled));

    controller.set_raw_query("ledger");
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(ids(&session.results()), vec!["a02"]);

    controller.set_raw_query("ledg");
    controller.clear_immediately();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(session.results().len(), 12);
    let events = drain(&mut rx);
    assert_eq!(settled_queries(&events), vec!["ledger", ""]);

    // The pending "ledg" timer was cancelled by the clear
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(settled_queries(&drain(&mut rx)).is_empty());
    // Empty queries are never remembered
    assert_eq!(session.history(), vec!["ledger"]);
}

#[tokio::test]
async fn query_and_facets_combine() {
    let provider = Arc::new(StaticProvider::unfiltered(sample_catalog()));
    let (session, _rx) = session_with(EngineConfig::default(), provider);

    session.apply_settled("report").await.unwrap();
    assert_eq!(ids(&session.results()), vec!["a01", "a04", "a06", "a12"]);

    session.set_facet("domain", ["finance", "ops"]).await.unwrap();
    assert_eq!(ids(&session.results()), vec!["a01", "a04", "a12"]);

    session.set_facet("status", ["active"]).await.unwrap();
    assert_eq!(ids(&session.results()), vec!["a01"]);

    // An emptied facet stops constraining
    session.set_facet("status", Vec::<String>::new()).await.unwrap();
    assert_eq!(ids(&session.results()), vec!["a01", "a04", "a12"]);

    session.clear_facet("domain").await.unwrap();
    assert_eq!(session.results().len(), 4);
}

#[tokio::test]
async fn prefiltering_provider_with_server_mode() {
    let config = EngineConfig {
        filter_mode: siftbox::FilterMode::Server,
        ..EngineConfig::default()
    };
    let provider = Arc::new(StaticProvider::new(sample_catalog()));
    let (session, _rx) = session_with(config, provider);

    let outcome = session.apply_settled("budget").await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { tag: 1, results: 1 });
    assert_eq!(ids(&session.results()), vec!["a07"]);
}

#[tokio::test]
async fn history_survives_a_new_session() {
    let store = Arc::new(MemoryStore::new());
    let make = || {
        SearchSession::new(
            EngineConfig::default(),
            Arc::new(StaticProvider::new(sample_catalog())),
            store.clone(),
            siftbox::EventSender::disconnected(),
        )
    };

    let first = make();
    for query in ["ledger", "payroll", "ledger", "  ", "incident"] {
        first.apply_settled(query).await.unwrap();
    }
    assert_eq!(first.history(), vec!["incident", "ledger", "payroll"]);

    let second = make();
    assert_eq!(second.history(), vec!["incident", "ledger", "payroll"]);

    second.clear_history();
    let mut reread = SearchHistoryStore::with_defaults(store.clone());
    assert!(reread.load().is_empty());
}

#[tokio::test]
async fn rollups_and_trends_are_published() {
    let provider = Arc::new(StaticProvider::unfiltered(sample_catalog()));
    let (session, mut rx) = session_with(EngineConfig::default(), provider);
    session.apply_settled("").await.unwrap();
    drain(&mut rx);

    let buckets = session.aggregate(
        |r: &Record| r.get("domain").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        |r: &Record| r.get("compliant").and_then(|v| v.as_bool()) == Some(true),
    );
    let summary: Vec<(&str, usize, usize, u32)> = buckets
        .iter()
        .map(|b| (b.key.as_str(), b.matched, b.total, b.percentage))
        .collect();
    assert_eq!(
        summary,
        vec![("finance", 3, 5, 60), ("hr", 1, 4, 25), ("ops", 3, 3, 100)]
    );

    let trend = session
        .trend(vec![
            TrendPoint::new("Q1", 42.0),
            TrendPoint::new("Q2", 47.5),
            TrendPoint::new("Q3", 58.0),
        ])
        .unwrap();
    assert_eq!(trend.len(), 3);
    assert!(session
        .trend(vec![TrendPoint::new("Q1", 1.0), TrendPoint::new("Q1", 2.0)])
        .is_err());

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            EngineEvent::AggregationReady(buckets),
            EngineEvent::TrendReady(trend)
        ]
    );
}
