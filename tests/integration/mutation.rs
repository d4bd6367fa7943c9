//! Optimistic writes against a live session index.

use std::sync::Arc;
use std::time::Duration;

use siftbox::{
    EngineConfig, EngineEvent, FilterMode, MutationError, Patch, Record, RemoteError,
    SearchSession, StaticProvider,
};

use crate::common::{drain, make_record, sample_catalog, session_with, ScriptedProvider};

fn status(session: &SearchSession, id: &str) -> Option<String> {
    session
        .index()
        .read()
        .get(id)
        .and_then(|r| r.get("status"))
        .and_then(|v| v.as_str().map(str::to_string))
}

async fn loaded_session() -> (Arc<SearchSession>, siftbox::EventReceiver) {
    let provider = Arc::new(StaticProvider::unfiltered(sample_catalog()));
    let (session, mut rx) = session_with(EngineConfig::default(), provider);
    session.apply_settled("").await.unwrap();
    drain(&mut rx);
    (session, rx)
}

#[tokio::test(start_paused = true)]
async fn second_write_to_same_record_is_rejected() {
    let (session, _rx) = loaded_session().await;
    let mutator = session.mutator();

    let first = mutator
        .mutate(
            "a03",
            Patch::new().set("status", "active"),
            |_id: String, patch: Patch| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                let server_copy = make_record("a03", "Payroll Summary", "draft", "hr");
                Ok::<Record, RemoteError>(server_copy.patched(&patch))
            },
        )
        .unwrap();
    assert_eq!(status(&session, "a03").as_deref(), Some("active"));

    let second = mutator.mutate("a03", Patch::new().set("status", "retired"), |_, _| {
        std::future::ready(Err(RemoteError::new("unused")))
    });
    assert!(matches!(
        second,
        Err(MutationError::ConcurrentMutation { ref record_id }) if record_id == "a03"
    ));
    // The first write is untouched by the rejected one
    assert_eq!(status(&session, "a03").as_deref(), Some("active"));

    // Other records are independent
    let other = mutator
        .mutate("a04", Patch::new().set("status", "active"), |id, _| {
            std::future::ready(Ok(Record::new(id).with("status", "active")))
        })
        .unwrap();
    other.settle().await.unwrap();

    let confirmed = first.settle().await.unwrap();
    assert_eq!(confirmed.get("status").and_then(|v| v.as_str()), Some("active"));
    assert!(!mutator.is_pending("a03"));

    // Free again once settled
    let third = mutator
        .mutate("a03", Patch::new().set("status", "retired"), |id, _| {
            std::future::ready(Ok(Record::new(id).with("status", "retired")))
        })
        .unwrap();
    third.settle().await.unwrap();
    assert_eq!(status(&session, "a03").as_deref(), Some("retired"));
}

#[tokio::test(start_paused = true)]
async fn rejected_write_rolls_back_and_notifies() {
    let (session, mut rx) = loaded_session().await;
    let mutator = session.mutator();
    let before = session.index().read().get("a05").cloned();

    let pending = mutator
        .mutate("a05", Patch::new().set("status", "retired").unset("domain"), |_, _| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err::<Record, _>(RemoteError::new("403 forbidden"))
        })
        .unwrap();

    // Visible to readers before the remote answers
    assert_eq!(status(&session, "a05").as_deref(), Some("retired"));
    assert!(session.results().iter().any(|r| r.id == "a05" && r.get("domain").is_none()));

    let err = pending.settle().await.unwrap_err();
    assert_eq!(session.index().read().get("a05").cloned(), before);
    assert_eq!(err.record_id(), "a05");

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    match &events[0] {
        EngineEvent::MutationFailed { record_id, error } => {
            assert_eq!(record_id, "a05");
            assert_eq!(error, &err);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn write_to_record_dropped_by_refresh_is_not_resurrected() {
    let provider = Arc::new(StaticProvider::new(sample_catalog()));
    let (session, _rx) = session_with(
        EngineConfig {
            filter_mode: FilterMode::Server,
            ..EngineConfig::default()
        },
        provider,
    );
    session.apply_settled("").await.unwrap();
    let mutator = session.mutator();

    let pending = mutator
        .mutate("a09", Patch::new().set("status", "retired"), |_, _| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err::<Record, _>(RemoteError::new("conflict"))
        })
        .unwrap();

    // A refresh for a narrower query replaces the collection without a09
    session.apply_settled("ledger").await.unwrap();
    assert!(!session.index().read().contains("a09"));

    assert!(pending.settle().await.is_err());
    assert!(!session.index().read().contains("a09"));
    assert!(!mutator.is_pending("a09"));
}

#[tokio::test]
async fn confirmed_write_takes_server_copy_unless_disabled() {
    let (session, _rx) = loaded_session().await;

    let server = |id: String, _: Patch| {
        std::future::ready(Ok::<_, RemoteError>(
            Record::new(id).with("status", "active").with("revision", 7i64),
        ))
    };

    session
        .mutator()
        .mutate("a08", Patch::new().set("status", "active"), server)
        .unwrap()
        .settle()
        .await
        .unwrap();
    let stored = session.index().read().get("a08").cloned().unwrap();
    assert_eq!(stored.get("revision").and_then(|v| v.as_f64()), Some(7.0));
    assert!(stored.get("name").is_none());

    let local_only = session.mutator().reconcile_with_server(false);
    local_only
        .mutate("a11", Patch::new().set("status", "draft"), server)
        .unwrap()
        .settle()
        .await
        .unwrap();
    let stored = session.index().read().get("a11").cloned().unwrap();
    assert_eq!(stored.get("status").and_then(|v| v.as_str()), Some("draft"));
    assert!(stored.get("revision").is_none());
    assert_eq!(
        stored.get("name").and_then(|v| v.as_str()),
        Some("Benefits Enrollment")
    );
}

#[tokio::test]
async fn handles_from_one_session_share_in_flight_writes() {
    let (session, _rx) = loaded_session().await;
    let first = session.mutator();
    let second = session.mutator();

    let pending = first
        .mutate("a01", Patch::new().set("status", "retired"), |id, _| {
            std::future::ready(Ok(Record::new(id).with("status", "retired")))
        })
        .unwrap();
    assert!(second.is_pending("a01"));
    assert!(matches!(
        second.mutate("a01", Patch::new(), |id, _| {
            std::future::ready(Ok(Record::new(id)))
        }),
        Err(MutationError::ConcurrentMutation { .. })
    ));

    pending.settle().await.unwrap();
    assert!(!second.is_pending("a01"));
}

// ----------------------------------------------------------------------------
// Refreshes that land while a write is in flight
// ----------------------------------------------------------------------------

fn field(session: &SearchSession, id: &str, name: &str) -> Option<String> {
    session
        .index()
        .read()
        .get(id)
        .and_then(|r| r.get(name))
        .and_then(|v| v.as_str().map(str::to_string))
}

/// A session whose provider answers "v1" with the original KPI and "v2" with
/// a newer server copy of it.
async fn versioned_session(reconcile: bool) -> (Arc<SearchSession>, siftbox::EventReceiver) {
    let provider = Arc::new(
        ScriptedProvider::new(vec![])
            .respond(
                "v1",
                0,
                vec![Record::new("k1").with("name", "Churn").with("status", "draft")],
            )
            .respond(
                "v2",
                0,
                vec![Record::new("k1").with("name", "Churn v2").with("status", "certified")],
            ),
    );
    let config = EngineConfig {
        filter_mode: FilterMode::Server,
        reconcile_with_server: reconcile,
        ..EngineConfig::default()
    };
    let (session, rx) = session_with(config, provider);
    session.apply_settled("v1").await.unwrap();
    (session, rx)
}

#[tokio::test(start_paused = true)]
async fn refresh_during_write_keeps_patch_over_new_copy() {
    let (session, _rx) = versioned_session(true).await;
    let pending = session
        .mutator()
        .mutate("k1", Patch::new().set("status", "active"), |_, _| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err::<Record, _>(RemoteError::new("rejected"))
        })
        .unwrap();

    session.apply_settled("v2").await.unwrap();
    assert_eq!(field(&session, "k1", "name").as_deref(), Some("Churn v2"));
    assert_eq!(field(&session, "k1", "status").as_deref(), Some("active"));
    assert!(session.mutator().is_pending("k1"));

    drop(pending);
}

#[tokio::test(start_paused = true)]
async fn rollback_after_refresh_restores_the_refreshed_copy() {
    let (session, _rx) = versioned_session(true).await;
    let pending = session
        .mutator()
        .mutate("k1", Patch::new().set("status", "active"), |_, _| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err::<Record, _>(RemoteError::new("rejected"))
        })
        .unwrap();

    session.apply_settled("v2").await.unwrap();
    let err = pending.settle().await.unwrap_err();

    assert_eq!(field(&session, "k1", "name").as_deref(), Some("Churn v2"));
    assert_eq!(field(&session, "k1", "status").as_deref(), Some("certified"));
    match err {
        MutationError::RemoteFailure { restored, .. } => {
            assert_eq!(restored.get("name").and_then(|v| v.as_str()), Some("Churn v2"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!session.mutator().is_pending("k1"));
}

#[tokio::test(start_paused = true)]
async fn confirmed_write_after_refresh_stays_visible_without_reconcile() {
    let (session, _rx) = versioned_session(false).await;
    let pending = session
        .mutator()
        .mutate("k1", Patch::new().set("status", "active"), |id, _| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, RemoteError>(Record::new(id).with("status", "active"))
        })
        .unwrap();

    session.apply_settled("v2").await.unwrap();
    pending.settle().await.unwrap();

    assert_eq!(field(&session, "k1", "status").as_deref(), Some("active"));
    assert_eq!(field(&session, "k1", "name").as_deref(), Some("Churn v2"));
    assert!(!session.mutator().is_pending("k1"));

    // Once settled, the next refresh shows the server copy as is
    session.apply_settled("v1").await.unwrap();
    assert_eq!(field(&session, "k1", "status").as_deref(), Some("draft"));
}

#[tokio::test(start_paused = true)]
async fn confirmed_write_after_refresh_takes_server_copy_with_reconcile() {
    let (session, _rx) = versioned_session(true).await;
    let pending = session
        .mutator()
        .mutate("k1", Patch::new().set("status", "active"), |id, _| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, RemoteError>(
                Record::new(id)
                    .with("name", "Churn v3")
                    .with("status", "active"),
            )
        })
        .unwrap();

    session.apply_settled("v2").await.unwrap();
    pending.settle().await.unwrap();

    assert_eq!(field(&session, "k1", "name").as_deref(), Some("Churn v3"));
    assert_eq!(field(&session, "k1", "status").as_deref(), Some("active"));
}

#[tokio::test]
async fn mismatched_server_id_does_not_add_a_record() {
    let (session, _rx) = loaded_session().await;
    let before = session.index().read().len();

    let confirmed = session
        .mutator()
        .mutate("a02", Patch::new().set("status", "retired"), |_, _| {
            std::future::ready(Ok(Record::new("A02-server").with("status", "retired")))
        })
        .unwrap()
        .settle()
        .await
        .unwrap();

    assert_eq!(confirmed.id, "a02");
    assert_eq!(session.index().read().len(), before);
    assert!(!session.index().read().contains("A02-server"));
    assert_eq!(status(&session, "a02").as_deref(), Some("retired"));
}
