//! Job list queries: filtering, sorting and pagination.
//!
//! A [`JobQuery`] is built once from request parameters and executed by every
//! backend. The in-memory store evaluates it directly, Firestore translates it
//! into a structured query.

use std::cmp::Ordering;

use serde::Deserialize;

use jobtrack_models::{Job, UserId};

/// Value meaning "no filter" for status and job type.
pub const MATCH_ALL: &str = "all";

/// Pagination limits.
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw list parameters, as received in a query string.
///
/// Page and limit stay strings so that non-numeric input falls back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub job_type: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Supported sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSort {
    /// Newest first
    Latest,
    /// Oldest first
    Oldest,
    /// Position ascending
    AToZ,
    /// Position descending
    ZToA,
}

impl JobSort {
    /// Parse a sort key. Unknown keys mean natural order.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "latest" => Some(Self::Latest),
            "oldest" => Some(Self::Oldest),
            "a-z" => Some(Self::AToZ),
            "z-a" => Some(Self::ZToA),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Oldest => "oldest",
            Self::AToZ => "a-z",
            Self::ZToA => "z-a",
        }
    }

    /// Stored field the sort applies to.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Latest | Self::Oldest => "createdAt",
            Self::AToZ | Self::ZToA => "position",
        }
    }

    pub const fn is_descending(&self) -> bool {
        matches!(self, Self::Latest | Self::ZToA)
    }

    /// Compare two jobs under this order. Ties fall back to id for stable pages.
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        let primary = match self {
            Self::Latest | Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::AToZ | Self::ZToA => a.position.cmp(&b.position),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        if self.is_descending() {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Conjunctive job filter. Always scoped to one owner.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFilter {
    pub owner: UserId,
    /// Lowercased substring matched against position.
    pub search: Option<String>,
    /// Exact stored status value.
    pub status: Option<String>,
    /// Exact stored job type value.
    pub job_type: Option<String>,
}

impl JobFilter {
    /// Every job of `owner`.
    pub fn owner(owner: UserId) -> Self {
        Self {
            owner,
            search: None,
            status: None,
            job_type: None,
        }
    }

    pub fn search(mut self, term: &str) -> Self {
        self.search = normalize_search(Some(term));
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = normalize_choice(Some(status));
        self
    }

    pub fn job_type(mut self, job_type: &str) -> Self {
        self.job_type = normalize_choice(Some(job_type));
        self
    }

    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Evaluate the filter against one job.
    pub fn matches(&self, job: &Job) -> bool {
        if job.created_by != self.owner {
            return false;
        }
        if let Some(status) = &self.status {
            if job.status.as_str() != status {
                return false;
            }
        }
        if let Some(job_type) = &self.job_type {
            if job.job_type.as_str() != job_type {
                return false;
            }
        }
        match &self.search {
            Some(term) => job.position.to_lowercase().contains(term.as_str()),
            None => true,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u64,
    pub size: u64,
}

impl Page {
    pub fn new(number: u64, size: u64) -> Self {
        Self {
            number: number.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Parse raw values, falling back to defaults for anything not a positive integer.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(
            parse_positive(page).unwrap_or(DEFAULT_PAGE),
            parse_positive(limit).unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    pub fn skip(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }

    pub fn take(&self) -> u64 {
        self.size
    }

    /// Number of pages needed for `total` items.
    pub fn count_for(&self, total: u64) -> u64 {
        total.div_ceil(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// A filtered, sorted, paginated job query.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    pub filter: JobFilter,
    /// `None` keeps the store's natural order.
    pub sort: Option<JobSort>,
    pub page: Page,
}

impl JobQuery {
    pub fn new(filter: JobFilter) -> Self {
        Self {
            filter,
            sort: None,
            page: Page::default(),
        }
    }

    pub fn sort(mut self, sort: JobSort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Build a query for `owner` from raw list parameters.
    pub fn from_params(owner: UserId, params: &ListParams) -> Self {
        let filter = JobFilter {
            owner,
            search: normalize_search(params.search.as_deref()),
            status: normalize_choice(params.status.as_deref()),
            job_type: normalize_choice(params.job_type.as_deref()),
        };

        Self {
            filter,
            sort: params.sort.as_deref().and_then(JobSort::parse),
            page: Page::from_params(params.page.as_deref(), params.limit.as_deref()),
        }
    }

    /// Order `jobs` in place. Natural order is creation then id.
    pub fn sort_jobs(&self, jobs: &mut [Job]) {
        match self.sort {
            Some(sort) => jobs.sort_by(|a, b| sort.compare(a, b)),
            None => jobs.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
    }

    /// Filter, sort and paginate a full candidate set in process.
    pub fn apply<I>(&self, jobs: I) -> Vec<Job>
    where
        I: IntoIterator<Item = Job>,
    {
        let mut matched: Vec<Job> = jobs.into_iter().filter(|j| self.filter.matches(j)).collect();
        self.sort_jobs(&mut matched);
        matched
            .into_iter()
            .skip(self.page.skip() as usize)
            .take(self.page.take() as usize)
            .collect()
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as u64)
}

fn normalize_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn normalize_choice(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && *s != MATCH_ALL)
        .map(str::to_string)
}
