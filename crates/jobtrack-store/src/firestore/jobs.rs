//! Firestore-backed job store.
//!
//! Jobs live in the top-level `jobs` collection, keyed by job id. Owner,
//! status and job type filters run server-side; position search has no
//! Firestore equivalent, so searched listings are filtered and paginated
//! here.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use jobtrack_models::{Job, JobChanges, JobId, UserId, YearMonth};

use super::client::FirestoreClient;
use super::types::{
    CollectionSelector, Document, FieldReference, FieldsExt, Filter, Order, Precondition,
    Projection, StructuredQuery, ToFirestoreValue, Value, Write,
};
use crate::aggregate::tally;
use crate::error::{StoreError, StoreResult};
use crate::query::{JobFilter, JobQuery};
use crate::store::JobStore;

pub const JOBS_COLLECTION: &str = "jobs";

mod fields {
    pub const COMPANY: &str = "company";
    pub const POSITION: &str = "position";
    pub const STATUS: &str = "status";
    pub const JOB_TYPE: &str = "jobType";
    pub const CREATED_BY: &str = "createdBy";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const NAME: &str = "__name__";
}

/// Job store over the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreJobStore {
    client: FirestoreClient,
}

impl FirestoreJobStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn document_name(&self, id: &JobId) -> String {
        self.client.full_document_name(JOBS_COLLECTION, id.as_str())
    }

    /// Read a job document, if `owner` owns it.
    async fn read_owned(&self, owner: &UserId, id: &JobId) -> StoreResult<Option<Document>> {
        let Some(doc) = self.client.get_document(JOBS_COLLECTION, id.as_str()).await? else {
            return Ok(None);
        };
        let created_by = doc
            .fields
            .as_ref()
            .and_then(|f| f.get_as::<String>(fields::CREATED_BY));
        if created_by.as_deref() != Some(owner.as_str()) {
            debug!(job_id = %id, "Job belongs to another owner");
            return Ok(None);
        }
        Ok(Some(doc))
    }

    /// Owned job that decodes cleanly, with its update time.
    async fn read_job(&self, owner: &UserId, id: &JobId) -> StoreResult<Option<(Job, Option<String>)>> {
        let Some(doc) = self.read_owned(owner, id).await? else {
            return Ok(None);
        };
        Ok(decode_job(&doc).map(|job| (job, doc.update_time)))
    }

    /// Rows of `filter` with only `select` fields, server-side filters only.
    async fn project(&self, filter: &JobFilter, select: &[&str]) -> StoreResult<Vec<Document>> {
        let mut query = filtered_query(filter);
        query.select = Some(Projection {
            fields: select.iter().map(|f| FieldReference::new(*f)).collect(),
        });
        self.client.run_query(query).await
    }
}

/// Precondition that the document is unchanged since it was read.
fn unchanged_since(update_time: Option<String>) -> Precondition {
    match update_time {
        Some(ts) => Precondition::updated_at(ts),
        None => Precondition::exists(true),
    }
}

#[async_trait]
impl JobStore for FirestoreJobStore {
    async fn insert(&self, job: &Job) -> StoreResult<()> {
        let doc = Document::named(self.document_name(&job.id), job_to_fields(job));
        self.client
            .commit(vec![Write::update(doc, Some(Precondition::exists(false)))])
            .await?;
        Ok(())
    }

    async fn get(&self, owner: &UserId, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.read_job(owner, id).await?.map(|(job, _)| job))
    }

    async fn update(&self, owner: &UserId, id: &JobId, changes: JobChanges) -> StoreResult<Option<Job>> {
        let Some((mut job, update_time)) = self.read_job(owner, id).await? else {
            return Ok(None);
        };
        job.apply(changes);

        let doc = Document::named(self.document_name(id), job_to_fields(&job));
        self.client
            .commit(vec![Write::update(doc, Some(unchanged_since(update_time)))])
            .await
            .map_err(|e| {
                if e.is_precondition_failed() {
                    warn!(job_id = %id, "Job changed during update");
                }
                e
            })?;
        Ok(Some(job))
    }

    async fn delete(&self, owner: &UserId, id: &JobId) -> StoreResult<bool> {
        let Some(Document { update_time, .. }) = self.read_owned(owner, id).await? else {
            return Ok(false);
        };
        self.client
            .commit(vec![Write::delete(
                self.document_name(id),
                Some(unchanged_since(update_time)),
            )])
            .await?;
        Ok(true)
    }

    async fn find(&self, query: &JobQuery) -> StoreResult<Vec<Job>> {
        let docs = self.client.run_query(list_query(query)).await?;
        let jobs = docs.iter().filter_map(decode_job);

        if !query.filter.has_search() {
            return Ok(jobs.collect());
        }

        // Already ordered server-side; only the search predicate and paging remain
        Ok(jobs
            .filter(|j| query.filter.matches(j))
            .skip(query.page.skip() as usize)
            .take(query.page.take() as usize)
            .collect())
    }

    async fn count(&self, filter: &JobFilter) -> StoreResult<u64> {
        if !filter.has_search() {
            return self.client.count(filtered_query(filter)).await;
        }

        // Same rows and predicate as a searched `find`
        let docs = self.client.run_query(filtered_query(filter)).await?;
        Ok(docs
            .iter()
            .filter_map(decode_job)
            .filter(|j| filter.matches(j))
            .count() as u64)
    }

    async fn count_by_status(&self, owner: &UserId) -> StoreResult<Vec<(String, u64)>> {
        let docs = self
            .project(&JobFilter::owner(owner.clone()), &[fields::STATUS])
            .await?;
        Ok(tally(
            docs.iter()
                .filter_map(|d| d.fields.as_ref())
                .filter_map(|f| f.get_as::<String>(fields::STATUS)),
        ))
    }

    async fn count_by_month(&self, owner: &UserId) -> StoreResult<Vec<(YearMonth, u64)>> {
        let docs = self
            .project(&JobFilter::owner(owner.clone()), &[fields::CREATED_AT])
            .await?;
        Ok(tally(
            docs.iter()
                .filter_map(|d| d.fields.as_ref())
                .filter_map(|f| f.get_as::<chrono::DateTime<chrono::Utc>>(fields::CREATED_AT))
                .map(|ts| YearMonth::of(&ts)),
        ))
    }

    async fn ping(&self) -> StoreResult<()> {
        let query = StructuredQuery {
            from: vec![jobs_collection()],
            limit: Some(1),
            ..Default::default()
        };
        self.client.run_query(query).await.map(|_| ())
    }
}

// ============================================================================
// Query Construction
// ============================================================================

fn jobs_collection() -> CollectionSelector {
    CollectionSelector {
        collection_id: JOBS_COLLECTION.to_string(),
        all_descendants: None,
    }
}

/// Equality filters of `filter`. Search is not expressible in Firestore.
fn filtered_query(filter: &JobFilter) -> StructuredQuery {
    let mut conditions = vec![Filter::equal(
        fields::CREATED_BY,
        filter.owner.as_str().to_firestore_value(),
    )];
    if let Some(status) = &filter.status {
        conditions.push(Filter::equal(fields::STATUS, status.to_firestore_value()));
    }
    if let Some(job_type) = &filter.job_type {
        conditions.push(Filter::equal(fields::JOB_TYPE, job_type.to_firestore_value()));
    }

    StructuredQuery {
        from: vec![jobs_collection()],
        r#where: Filter::and(conditions),
        ..Default::default()
    }
}

/// Full listing query. Paging is pushed down unless a search term is present.
pub(crate) fn list_query(query: &JobQuery) -> StructuredQuery {
    let mut structured = filtered_query(&query.filter);

    if let Some(sort) = query.sort {
        let direction = if sort.is_descending() { "DESCENDING" } else { "ASCENDING" };
        structured.order_by = Some(vec![
            Order {
                field: FieldReference::new(sort.field()),
                direction: direction.to_string(),
            },
            // Secondary sort by document ID for stable pagination
            Order {
                field: FieldReference::new(fields::NAME),
                direction: direction.to_string(),
            },
        ]);
    }

    if !query.filter.has_search() {
        structured.offset = Some(query.page.skip().min(i32::MAX as u64) as i32);
        structured.limit = Some(query.page.take().min(i32::MAX as u64) as i32);
    }

    structured
}

// ============================================================================
// Field Conversion Helpers
// ============================================================================

fn job_to_fields(job: &Job) -> HashMap<String, Value> {
    let mut map = HashMap::new();
    map.insert(fields::COMPANY.to_string(), job.company.to_firestore_value());
    map.insert(fields::POSITION.to_string(), job.position.to_firestore_value());
    map.insert(fields::STATUS.to_string(), job.status.as_str().to_firestore_value());
    map.insert(fields::JOB_TYPE.to_string(), job.job_type.as_str().to_firestore_value());
    map.insert(fields::CREATED_BY.to_string(), job.created_by.as_str().to_firestore_value());
    map.insert(fields::CREATED_AT.to_string(), job.created_at.to_firestore_value());
    map.insert(fields::UPDATED_AT.to_string(), job.updated_at.to_firestore_value());
    map
}

/// Decode a listed row, skipping documents this version cannot represent.
fn decode_job(doc: &Document) -> Option<Job> {
    document_to_job(doc)
        .map_err(|e| warn!(document = ?doc.name, "Skipping undecodable job: {}", e))
        .ok()
}

fn document_to_job(doc: &Document) -> StoreResult<Job> {
    let map = doc.fields()?;
    let id = doc
        .id()
        .ok_or_else(|| StoreError::InvalidResponse("Job document has no name".to_string()))?;

    let status: String = map.require(fields::STATUS)?;
    let job_type: String = map.require(fields::JOB_TYPE)?;
    let created_at = map.require(fields::CREATED_AT)?;

    Ok(Job {
        id: JobId::from(id),
        company: map.require(fields::COMPANY)?,
        position: map.require(fields::POSITION)?,
        status: status
            .parse()
            .map_err(|e| StoreError::InvalidResponse(format!("Job {}: {}", id, e)))?,
        job_type: job_type
            .parse()
            .map_err(|e| StoreError::InvalidResponse(format!("Job {}: {}", id, e)))?,
        created_by: UserId::from(map.require::<String>(fields::CREATED_BY)?),
        created_at,
        updated_at: map.get_as(fields::UPDATED_AT).unwrap_or(created_at),
    })
}
