//! Job repository: owner-scoped operations over any [`JobStore`].

use std::sync::Arc;

use tracing::{debug, info};

use jobtrack_models::{Job, JobFields, JobId, MonthlyCount, StatusCounts, UserId};

use crate::aggregate::{monthly_counts, status_counts};
use crate::error::{StoreError, StoreResult};
use crate::query::{JobFilter, JobQuery, ListParams};
use crate::store::JobStore;

/// One page of a job listing.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total_jobs: u64,
    pub num_of_pages: u64,
}

/// Repository for job applications.
#[derive(Clone)]
pub struct JobRepository {
    store: Arc<dyn JobStore>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    fn check_owner(owner: &UserId) -> StoreResult<()> {
        if owner.as_str().trim().is_empty() {
            return Err(StoreError::invalid_input("Owner id is required"));
        }
        Ok(())
    }

    fn not_found(id: &JobId) -> StoreError {
        StoreError::not_found(format!("No job was found with id {}.", id))
    }

    /// List the owner's jobs. Items and totals use the same filter.
    pub async fn list(&self, owner: &UserId, params: &ListParams) -> StoreResult<JobPage> {
        Self::check_owner(owner)?;
        self.run(&JobQuery::from_params(owner.clone(), params)).await
    }

    /// Execute a prepared query.
    pub async fn run(&self, query: &JobQuery) -> StoreResult<JobPage> {
        Self::check_owner(&query.filter.owner)?;

        let (jobs, total_jobs) =
            tokio::try_join!(self.store.find(query), self.store.count(&query.filter))?;

        debug!(
            owner = %query.filter.owner,
            returned = jobs.len(),
            total_jobs,
            "Listed jobs"
        );

        Ok(JobPage {
            jobs,
            total_jobs,
            num_of_pages: query.page.count_for(total_jobs),
        })
    }

    pub async fn get(&self, owner: &UserId, id: &JobId) -> StoreResult<Job> {
        Self::check_owner(owner)?;
        self.store
            .get(owner, id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Create a job owned by `owner`.
    pub async fn create(&self, owner: &UserId, fields: JobFields) -> StoreResult<Job> {
        Self::check_owner(owner)?;
        let job = Job::new(owner.clone(), fields.into_changes()?);
        self.store.insert(&job).await?;
        info!(owner = %owner, job_id = %job.id, "Created job");
        Ok(job)
    }

    /// Replace company and position, and status/type when supplied.
    pub async fn update(&self, owner: &UserId, id: &JobId, fields: JobFields) -> StoreResult<Job> {
        Self::check_owner(owner)?;
        let changes = fields.into_changes()?;
        let job = self
            .store
            .update(owner, id, changes)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        info!(owner = %owner, job_id = %id, "Updated job");
        Ok(job)
    }

    pub async fn delete(&self, owner: &UserId, id: &JobId) -> StoreResult<()> {
        Self::check_owner(owner)?;
        if !self.store.delete(owner, id).await? {
            return Err(Self::not_found(id));
        }
        info!(owner = %owner, job_id = %id, "Deleted job");
        Ok(())
    }

    pub async fn status_counts(&self, owner: &UserId) -> StoreResult<StatusCounts> {
        Self::check_owner(owner)?;
        Ok(status_counts(self.store.count_by_status(owner).await?))
    }

    pub async fn monthly_counts(&self, owner: &UserId, months_back: usize) -> StoreResult<Vec<MonthlyCount>> {
        Self::check_owner(owner)?;
        Ok(monthly_counts(self.store.count_by_month(owner).await?, months_back))
    }

    /// Number of jobs the owner has in total.
    pub async fn count_all(&self, owner: &UserId) -> StoreResult<u64> {
        Self::check_owner(owner)?;
        self.store.count(&JobFilter::owner(owner.clone())).await
    }
}
