//! Status and monthly summaries built from per-group counts.

use std::collections::BTreeMap;

use tracing::debug;

use jobtrack_models::{JobStatus, MonthlyCount, StatusCounts, YearMonth};

/// Default number of months in the monthly summary.
pub const DEFAULT_MONTHS_BACK: usize = 6;

/// Count occurrences of each key, ordered by key.
pub fn tally<K, I>(keys: I) -> Vec<(K, u64)>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut groups: BTreeMap<K, u64> = BTreeMap::new();
    for key in keys {
        *groups.entry(key).or_insert(0) += 1;
    }
    groups.into_iter().collect()
}

/// Fold raw status groups into the fixed three-key summary.
///
/// Statuses outside the known set are dropped, not merged.
pub fn status_counts<I>(groups: I) -> StatusCounts
where
    I: IntoIterator<Item = (String, u64)>,
{
    let mut counts = StatusCounts::default();
    for (raw, count) in groups {
        match raw.parse::<JobStatus>() {
            Ok(status) => counts.add(status, count),
            Err(_) => debug!(status = %raw, count, "Dropping unknown status from summary"),
        }
    }
    counts
}

/// Keep the `months_back` most recent months, oldest first.
pub fn monthly_counts<I>(groups: I, months_back: usize) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = (YearMonth, u64)>,
{
    let mut merged: BTreeMap<YearMonth, u64> = BTreeMap::new();
    for (month, count) in groups {
        *merged.entry(month).or_insert(0) += count;
    }

    let mut window: Vec<(YearMonth, u64)> = merged.into_iter().rev().take(months_back).collect();
    window.reverse();

    window
        .into_iter()
        .map(|(month, count)| MonthlyCount {
            label: month.label(),
            count,
        })
        .collect()
}
