//! Storage traits implemented by every backend.

use async_trait::async_trait;

use jobtrack_models::{Job, JobChanges, JobId, User, UserId, YearMonth};

use crate::error::StoreResult;
use crate::query::{JobFilter, JobQuery};

/// Persistence for job applications.
///
/// Every read and write is scoped to an owner; a job owned by someone else
/// behaves exactly like a missing one.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: &Job) -> StoreResult<()>;

    async fn get(&self, owner: &UserId, id: &JobId) -> StoreResult<Option<Job>>;

    /// Apply changes as one read-modify-write. `None` if absent or not owned.
    async fn update(&self, owner: &UserId, id: &JobId, changes: JobChanges) -> StoreResult<Option<Job>>;

    /// Returns false if absent or not owned.
    async fn delete(&self, owner: &UserId, id: &JobId) -> StoreResult<bool>;

    /// One page of matching jobs, in query order.
    async fn find(&self, query: &JobQuery) -> StoreResult<Vec<Job>>;

    /// Number of jobs matching the filter, ignoring pagination.
    async fn count(&self, filter: &JobFilter) -> StoreResult<u64>;

    /// Job counts grouped by raw stored status.
    async fn count_by_status(&self, owner: &UserId) -> StoreResult<Vec<(String, u64)>>;

    /// Job counts grouped by creation month.
    async fn count_by_month(&self, owner: &UserId) -> StoreResult<Vec<(YearMonth, u64)>>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Persistence for user accounts. Emails are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `EmailTaken` if the email is taken.
    async fn insert(&self, user: &User) -> StoreResult<()>;

    async fn get(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Replace a stored user. Fails with `EmailTaken` if the new email is
    /// taken by someone else, `NotFound` if the user is gone.
    async fn update(&self, user: &User) -> StoreResult<()>;
}
