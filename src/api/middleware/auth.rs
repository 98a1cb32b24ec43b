//! Identity middleware.
//!
//! Resolves `X-Acting-User` through the access-control collaborator and
//! injects the resulting `ActingContext` into request extensions. The
//! pipeline never sees a request without one.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ACTING_USER_HEADER};

pub async fn require_user(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_user_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_user_inner(mut req: Request<axum::body::Body>, next: Next) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let user = req
        .headers()
        .get(ACTING_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let acting = ctx.orchestrator.access_control().resolve(user).ok_or_else(|| {
        tracing::warn!(user, "Unknown acting user");
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(acting);
    Ok(next.run(req).await)
}
