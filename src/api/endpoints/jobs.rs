//! Job endpoints.
//!
//! `POST /api/jobs` starts a job on a background task and answers 202
//! straight away; progress is read back through `GET /api/jobs/:id`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{Job, JobStatus, JobStatusReport};
use crate::pipeline::collaborators::ActingContext;

#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    pub document_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StartJobResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// `POST /api/jobs`
pub async fn start(
    State(ctx): State<ApiContext>,
    Extension(acting): Extension<ActingContext>,
    payload: Result<Json<StartJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartJobResponse>), ApiError> {
    let Json(request) = payload?;
    let job = ctx.orchestrator.start_job(&acting, &request.document_ids)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(StartJobResponse {
            job_id: job.id,
            status: job.status,
        }),
    ))
}

/// `GET /api/jobs/:id`
pub async fn status(
    State(ctx): State<ApiContext>,
    Extension(acting): Extension<ActingContext>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusReport>, ApiError> {
    Ok(Json(ctx.orchestrator.get_job_status(&acting, &job_id)?))
}

/// `POST /api/jobs/:id/cancel`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(acting): Extension<ActingContext>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(ctx.orchestrator.cancel_job(&acting, &job_id)?))
}
