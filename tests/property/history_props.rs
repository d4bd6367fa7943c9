//! Search history stays bounded, unique and most-recent-first.

use proptest::prelude::*;
use siftbox::{MemoryStore, SearchHistoryStore};
use std::sync::Arc;

fn query_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "", "  ", "revenue", "ledger", " ledger ", "payroll", "incident", "capacity", "café",
        "budget", "report",
    ])
    .prop_map(str::to_string)
}

proptest! {
    #[test]
    fn history_is_bounded_and_unique(
        queries in prop::collection::vec(query_strategy(), 0..40),
        limit in 0usize..8,
    ) {
        let mut history = SearchHistoryStore::new(MemoryStore::new(), "h", limit);
        for q in &queries {
            history.record(q);
        }

        let list = history.list();
        prop_assert!(list.len() <= limit);
        for (i, entry) in list.iter().enumerate() {
            prop_assert!(!entry.trim().is_empty());
            prop_assert_eq!(entry.trim(), entry.as_str());
            prop_assert!(!list[i + 1..].contains(entry));
        }
    }

    #[test]
    fn front_is_last_non_blank_query(queries in prop::collection::vec(query_strategy(), 1..20)) {
        let mut history = SearchHistoryStore::new(MemoryStore::new(), "h", 5);
        for q in &queries {
            history.record(q);
        }

        let last = queries.iter().rev().map(|q| q.trim()).find(|q| !q.is_empty());
        prop_assert_eq!(history.list().first().map(String::as_str), last);
    }

    #[test]
    fn reload_sees_the_same_list(queries in prop::collection::vec(query_strategy(), 0..20)) {
        let store = Arc::new(MemoryStore::new());
        let mut writer = SearchHistoryStore::new(store.clone(), "h", 5);
        for q in &queries {
            writer.record(q);
        }

        let mut reader = SearchHistoryStore::new(store, "h", 5);
        prop_assert_eq!(reader.load(), writer.list());
    }
}
