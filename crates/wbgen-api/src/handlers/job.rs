//! Job endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use validator::Validate;

use wbgen_core::error::AppError;
use wbgen_core::types::id::JobId;

use crate::dto::request::CreateJobRequest;
use crate::dto::response::{map_page, ApiResponse, JobDetailsView, JobView, TaskView};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// `POST /api/jobs`
///
/// Debits the token cost and starts generation in the background; the
/// response returns as soon as the job rows exist.
pub async fn create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let job = state.jobs.create(payload.into_spec(auth.user_id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(JobView::from(job))),
    ))
}

/// `GET /api/jobs/{id}`
pub async fn get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.jobs.get_details(auth.user_id, job_id).await?;

    let mut tasks: Vec<TaskView> = details.tasks.into_iter().map(TaskView::from).collect();
    tasks.sort_by_key(|t| t.card_index);

    Ok(Json(ApiResponse::ok(JobDetailsView {
        job: JobView::from(details.job),
        tasks,
    })))
}

/// `GET /api/jobs`
pub async fn list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .jobs
        .list(auth.user_id, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(map_page::<_, JobView>(page))))
}
