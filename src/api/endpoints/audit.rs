//! `GET /api/audit?job_id&agent_kind&action&limit`

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{AuditEntry, AuditFilter};
use crate::pipeline::collaborators::ActingContext;

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(acting): Extension<ActingContext>,
    query: Result<Query<AuditFilter>, QueryRejection>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let Query(filter) = query?;
    Ok(Json(ctx.orchestrator.list_audit_entries(&acting, &filter)?))
}
