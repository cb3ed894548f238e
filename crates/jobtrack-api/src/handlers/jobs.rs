//! Job handlers. Every operation is scoped to the caller.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Serialize;

use jobtrack_models::{Job, JobFields, JobId, MonthlyCount, StatusCounts};
use jobtrack_store::{ListParams, DEFAULT_MONTHS_BACK};

use crate::auth::{AuthUser, WritableUser};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsResponse {
    pub jobs: Vec<Job>,
    pub total_jobs: u64,
    pub num_of_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub default_stats: StatusCounts,
    pub monthly_applications: Vec<MonthlyCount>,
}

/// List the caller's jobs with search, filters, sort and pagination.
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<ListParams>, ApiError>,
) -> ApiResult<Json<JobsResponse>> {
    let page = state.jobs.list(&user.user_id, &params).await?;
    Ok(Json(JobsResponse {
        jobs: page.jobs,
        total_jobs: page.total_jobs,
        num_of_pages: page.num_of_pages,
    }))
}

/// Status counts and the last six months of applications.
pub async fn job_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<StatsResponse>> {
    let (default_stats, monthly_applications) = tokio::try_join!(
        state.jobs.status_counts(&user.user_id),
        state.jobs.monthly_counts(&user.user_id, DEFAULT_MONTHS_BACK),
    )?;
    Ok(Json(StatsResponse {
        default_stats,
        monthly_applications,
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<Json<JobResponse>> {
    let job = state.jobs.get(&user.user_id, &JobId::from(id)).await?;
    Ok(Json(JobResponse { job }))
}

/// Create a job owned by the caller.
pub async fn create_job(
    State(state): State<AppState>,
    WritableUser(user): WritableUser,
    WithRejection(Json(fields), _): WithRejection<Json<JobFields>, ApiError>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let job = state.jobs.create(&user.user_id, fields).await?;
    metrics::record_job_created(job.status.as_str());
    Ok((StatusCode::CREATED, Json(JobResponse { job })))
}

pub async fn update_job(
    State(state): State<AppState>,
    WritableUser(user): WritableUser,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Json(fields), _): WithRejection<Json<JobFields>, ApiError>,
) -> ApiResult<Json<JobResponse>> {
    let job = state.jobs.update(&user.user_id, &JobId::from(id), fields).await?;
    Ok(Json(JobResponse { job }))
}

/// Delete a job. Responds 200 with an empty body.
pub async fn delete_job(
    State(state): State<AppState>,
    WritableUser(user): WritableUser,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<StatusCode> {
    state.jobs.delete(&user.user_id, &JobId::from(id)).await?;
    metrics::record_job_deleted();
    Ok(StatusCode::OK)
}
