//! Statistics summaries over a user's jobs.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobStatus;

/// Per-status job counts. Keys are fixed to the known statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub interview: u64,
    pub declined: u64,
}

impl StatusCounts {
    pub fn get(&self, status: JobStatus) -> u64 {
        match status {
            JobStatus::Pending => self.pending,
            JobStatus::Interview => self.interview,
            JobStatus::Declined => self.declined,
        }
    }

    pub fn add(&mut self, status: JobStatus, count: u64) {
        match status {
            JobStatus::Pending => self.pending += count,
            JobStatus::Interview => self.interview += count,
            JobStatus::Declined => self.declined += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.interview + self.declined
    }
}

/// Calendar month bucket, ordered by year then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Bucket of a UTC timestamp.
    pub fn of(ts: &DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// Human-readable label, e.g. "Mar 2024".
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => date.format("%b %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Number of applications created in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub label: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_year_month_ordering() {
        assert!(YearMonth::new(2023, 12) < YearMonth::new(2024, 1));
        assert!(YearMonth::new(2024, 2) < YearMonth::new(2024, 10));
    }

    #[test]
    fn test_year_month_label() {
        assert_eq!(YearMonth::new(2024, 3).label(), "Mar 2024");
        assert_eq!(YearMonth::new(2023, 12).label(), "Dec 2023");
    }

    #[test]
    fn test_year_month_of_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 7, 31, 23, 59, 59).unwrap();
        assert_eq!(YearMonth::of(&ts), YearMonth::new(2024, 7));
    }

    #[test]
    fn test_status_counts_total() {
        let mut counts = StatusCounts::default();
        counts.add(JobStatus::Declined, 2);
        counts.add(JobStatus::Pending, 1);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(JobStatus::Declined), 2);
        assert_eq!(counts.get(JobStatus::Interview), 0);
    }
}
