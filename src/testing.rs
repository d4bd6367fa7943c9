//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical fixtures so tests agree on what a catalog looks like.

#![doc(hidden)]

use crate::types::{FieldValue, Record};

/// A catalog record with the fields most pages use.
pub fn make_record(id: &str, name: &str, status: &str, domain: &str) -> Record {
    Record::new(id)
        .with("name", name)
        .with("status", status)
        .with("domain", domain)
}

/// A record with tags.
pub fn make_tagged(id: &str, name: &str, tags: &[&str]) -> Record {
    Record::new(id)
        .with("name", name)
        .with("tags", tags.iter().copied().collect::<FieldValue>())
}

/// A small governance catalog: twelve assets across three domains.
///
/// Compliance (`compliant: true`) is 3/5 in finance, 1/4 in hr, 3/3 in ops.
pub fn sample_catalog() -> Vec<Record> {
    let rows: [(&str, &str, &str, &str, bool); 12] = [
        ("a01", "Revenue Report", "active", "finance", true),
        ("a02", "Ledger Extract", "active", "finance", true),
        ("a03", "Payroll Summary", "draft", "hr", false),
        ("a04", "Cost Center Report", "draft", "finance", false),
        ("a05", "Pipeline Health", "active", "ops", true),
        ("a06", "Headcount Report", "active", "hr", true),
        ("a07", "Budget Variance", "retired", "finance", true),
        ("a08", "Attrition Model", "draft", "hr", false),
        ("a09", "Incident Log", "active", "ops", true),
        ("a10", "Accounts Payable", "active", "finance", false),
        ("a11", "Benefits Enrollment", "active", "hr", false),
        ("a12", "Capacity Report", "draft", "ops", true),
    ];
    rows.iter()
        .map(|(id, name, status, domain, compliant)| {
            make_record(id, name, status, domain).with("compliant", *compliant)
        })
        .collect()
}
