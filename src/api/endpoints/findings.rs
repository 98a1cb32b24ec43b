//! Finding endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{Finding, FindingFilter, ReviewStatus};
use crate::pipeline::collaborators::ActingContext;

/// `GET /api/findings?job_id&agent_kind&severity&review_status&flagged`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(acting): Extension<ActingContext>,
    query: Result<Query<FindingFilter>, QueryRejection>,
) -> Result<Json<Vec<Finding>>, ApiError> {
    let Query(filter) = query?;
    Ok(Json(ctx.orchestrator.list_findings(&acting, &filter)?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewStatusRequest {
    pub status: ReviewStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// `PUT /api/findings/:id/review-status`
pub async fn set_review_status(
    State(ctx): State<ApiContext>,
    Extension(acting): Extension<ActingContext>,
    Path(finding_id): Path<String>,
    payload: Result<Json<ReviewStatusRequest>, JsonRejection>,
) -> Result<Json<Finding>, ApiError> {
    let Json(request) = payload?;
    let finding = ctx
        .orchestrator
        .set_finding_review_status(&acting, &finding_id, request.status, request.note.as_deref())
        .await?;
    Ok(Json(finding))
}
