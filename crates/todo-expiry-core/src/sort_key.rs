//! Sort key normalisation for findings.
//!
//! Converts a `(due date, commit date)` pair into a lexicographically-sortable
//! string so that ordering by key surfaces the most urgent items first.
//!
//! # Ordering rules
//!
//! - Earlier due date first
//! - Undated items after every dated item (unbounded future)
//! - Within the same due date, the oldest commit first

use chrono::NaiveDate;

/// Stands in for a missing due date. Sorts after every `YYYY-MM-DD` date.
pub const UNDATED: &str = "9999-99-99";

/// Normalise a due date into a sortable segment.
///
/// `Some(2021-10-10)` → `"2021-10-10"`, `None` → [`UNDATED`].
pub fn normalize_due(due: Option<NaiveDate>) -> String {
    match due {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => UNDATED.to_string(),
    }
}

/// Full key for a finding.
///
/// `(Some(2021-10-10), 2023-05-11)` → `"2021-10-10~2023-05-11"`
pub fn finding_key(due: Option<NaiveDate>, committed: NaiveDate) -> String {
    format!("{}~{}", normalize_due(due), committed.format("%Y-%m-%d"))
}
