//! In-memory stores for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use jobtrack_models::{Job, JobChanges, JobId, User, UserId, YearMonth};

use crate::aggregate::tally;
use crate::error::{StoreError, StoreResult};
use crate::query::{JobFilter, JobQuery};
use crate::store::{JobStore, UserStore};

/// Jobs held in a map guarded by a single lock.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &Job) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(format!("jobs/{}", job.id)));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get(&self, owner: &UserId, id: &JobId) -> StoreResult<Option<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).filter(|j| j.is_owned_by(owner)).cloned())
    }

    async fn update(&self, owner: &UserId, id: &JobId, changes: JobChanges) -> StoreResult<Option<Job>> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id).filter(|j| j.is_owned_by(owner)) {
            Some(job) => {
                job.apply(changes);
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: &UserId, id: &JobId) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        if jobs.get(id).is_some_and(|j| j.is_owned_by(owner)) {
            jobs.remove(id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn find(&self, query: &JobQuery) -> StoreResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        Ok(query.apply(jobs.values().cloned()))
    }

    async fn count(&self, filter: &JobFilter) -> StoreResult<u64> {
        let jobs = self.jobs.read().await;
        Ok(jobs.values().filter(|j| filter.matches(j)).count() as u64)
    }

    async fn count_by_status(&self, owner: &UserId) -> StoreResult<Vec<(String, u64)>> {
        let jobs = self.jobs.read().await;
        Ok(tally(
            jobs.values()
                .filter(|j| j.is_owned_by(owner))
                .map(|j| j.status.as_str().to_string()),
        ))
    }

    async fn count_by_month(&self, owner: &UserId) -> StoreResult<Vec<(YearMonth, u64)>> {
        let jobs = self.jobs.read().await;
        Ok(tally(
            jobs.values()
                .filter(|j| j.is_owned_by(owner))
                .map(|j| YearMonth::of(&j.created_at)),
        ))
    }
}

#[derive(Default)]
struct UserTables {
    by_id: HashMap<UserId, User>,
    id_by_email: HashMap<String, UserId>,
}

/// Users with a unique email index, both behind one lock.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<UserTables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.id_by_email.contains_key(&user.email) {
            return Err(StoreError::EmailTaken(user.email.clone()));
        }
        tables.id_by_email.insert(user.email.clone(), user.id.clone());
        tables.by_id.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.by_id.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .id_by_email
            .get(email)
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        let previous_email = match tables.by_id.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => return Err(StoreError::not_found(format!("No user with id {}", user.id))),
        };

        if previous_email != user.email {
            if tables.id_by_email.contains_key(&user.email) {
                return Err(StoreError::EmailTaken(user.email.clone()));
            }
            tables.id_by_email.remove(&previous_email);
            tables.id_by_email.insert(user.email.clone(), user.id.clone());
        }

        tables.by_id.insert(user.id.clone(), user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrack_models::{JobFields, JobStatus, NewUser};
    use tokio_test::{assert_err, assert_ok};

    fn new_job(owner: &str, position: &str) -> Job {
        Job::new(
            UserId::from(owner),
            JobFields::new("Acme", position).into_changes().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_other_owner_sees_nothing() {
        let store = MemoryJobStore::new();
        let job = new_job("alice", "Dev");
        store.insert(&job).await.unwrap();

        let bob = UserId::from("bob");
        assert!(store.get(&bob, &job.id).await.unwrap().is_none());
        assert!(!store.delete(&bob, &job.id).await.unwrap());
        let changes = JobFields::new("X", "Y").into_changes().unwrap();
        assert!(store.update(&bob, &job.id, changes).await.unwrap().is_none());

        let alice = UserId::from("alice");
        assert_eq!(store.get(&alice, &job.id).await.unwrap(), Some(job));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryJobStore::new();
        let job = new_job("alice", "Dev");
        store.insert(&job).await.unwrap();
        let alice = UserId::from("alice");

        let changes = JobFields::new("Globex", "Lead")
            .status(JobStatus::Interview)
            .into_changes()
            .unwrap();
        let updated = store.update(&alice, &job.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.company, "Globex");
        assert_eq!(updated.status, JobStatus::Interview);
        assert_eq!(updated.created_at, job.created_at);

        assert!(store.delete(&alice, &job.id).await.unwrap());
        assert!(!store.delete(&alice, &job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_counts_by_status_are_scoped() {
        let store = MemoryJobStore::new();
        store.insert(&new_job("alice", "A")).await.unwrap();
        store.insert(&new_job("alice", "B")).await.unwrap();
        store.insert(&new_job("bob", "C")).await.unwrap();

        let groups = store.count_by_status(&UserId::from("alice")).await.unwrap();
        assert_eq!(groups, vec![("pending".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let store = MemoryUserStore::new();
        let alice = User::new(&NewUser::new("Alice", "a@x.com", "pw"), "h".into());
        store.insert(&alice).await.unwrap();

        let clash = User::new(&NewUser::new("Other", "A@X.com", "pw"), "h".into());
        assert!(matches!(
            store.insert(&clash).await,
            Err(StoreError::EmailTaken(_))
        ));

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);
    }

    #[tokio::test]
    async fn test_user_update_moves_email_index() {
        let store = MemoryUserStore::new();
        let mut alice = User::new(&NewUser::new("Alice", "a@x.com", "pw"), "h".into());
        let bob = User::new(&NewUser::new("Bobby", "b@x.com", "pw"), "h".into());
        store.insert(&alice).await.unwrap();
        store.insert(&bob).await.unwrap();

        alice.email = "b@x.com".into();
        assert_err!(store.update(&alice).await);

        alice.email = "alice@x.com".into();
        assert_ok!(store.update(&alice).await);
        assert!(store.find_by_email("a@x.com").await.unwrap().is_none());
        assert_eq!(
            store.find_by_email("alice@x.com").await.unwrap().unwrap().id,
            alice.id
        );
    }
}
