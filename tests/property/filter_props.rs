//! Filtering keeps order and combines facets with AND.

use proptest::prelude::*;
use siftbox::{FilterComposer, Record, RecordIndex};

use crate::common::make_record;

const STATUSES: [&str; 3] = ["active", "draft", "retired"];
const DOMAINS: [&str; 3] = ["finance", "hr", "ops"];
const WORDS: [&str; 6] = ["Revenue", "Ledger", "Report", "Payroll", "Incident", "Budget"];

fn record_strategy() -> impl Strategy<Value = (usize, usize, usize, usize)> {
    (0..WORDS.len(), 0..WORDS.len(), 0..STATUSES.len(), 0..DOMAINS.len())
}

fn collection_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..30).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (w1, w2, s, d))| {
                make_record(
                    &format!("r{i:02}"),
                    &format!("{} {}", WORDS[w1], WORDS[w2]),
                    STATUSES[s],
                    DOMAINS[d],
                )
            })
            .collect()
    })
}

fn selection_strategy(options: &'static [&'static str]) -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(options.to_vec(), 0..=options.len())
        .prop_map(|v| v.into_iter().map(str::to_string).collect())
}

fn positions(all: &[Record], subset: &[Record]) -> Vec<usize> {
    subset
        .iter()
        .filter_map(|r| all.iter().position(|a| a.id == r.id))
        .collect()
}

proptest! {
    #[test]
    fn results_are_an_ordered_subsequence(
        records in collection_strategy(),
        query in prop::sample::select(vec!["", "rev", "REPORT", "ledger budget", "x"]),
        statuses in selection_strategy(&STATUSES),
    ) {
        let mut composer = FilterComposer::new(["name"]);
        composer.set_query(query);
        composer.set_facet("status", statuses);

        let index = RecordIndex::from_records(records.clone());
        let results = index.query(composer.predicate());

        let pos = positions(&records, &results);
        prop_assert_eq!(pos.len(), results.len());
        prop_assert!(pos.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn adding_a_facet_never_widens(
        records in collection_strategy(),
        statuses in selection_strategy(&STATUSES),
        domains in selection_strategy(&DOMAINS),
    ) {
        let mut composer = FilterComposer::new(["name"]);
        composer.set_facet("status", statuses.clone());
        let index = RecordIndex::from_records(records);
        let before = index.query(composer.predicate());

        composer.set_facet("domain", domains.clone());
        let after = index.query(composer.predicate());

        prop_assert!(after.len() <= before.len());
        prop_assert!(after.iter().all(|r| before.contains(r)));
        if domains.is_empty() {
            prop_assert_eq!(after, before);
        }
    }

    #[test]
    fn empty_selection_matches_everything(records in collection_strategy()) {
        let composer = FilterComposer::new(["name", "description"]);
        let index = RecordIndex::from_records(records.clone());
        prop_assert_eq!(index.query(composer.predicate()), records);
    }
}
