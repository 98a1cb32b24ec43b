//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Context injection → 2. Identity resolver → 3. Request logger

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{Extension, Router};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::pipeline::Orchestrator;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(orchestrator: Arc<Orchestrator>) -> Router {
    let ctx = ApiContext::new(orchestrator);

    // Layers are applied bottom (innermost) to top (outermost).
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/jobs", post(endpoints::jobs::start))
        .route("/jobs/:id", get(endpoints::jobs::status))
        .route("/jobs/:id/cancel", post(endpoints::jobs::cancel))
        .route("/findings", get(endpoints::findings::list))
        .route(
            "/findings/:id/review-status",
            put(endpoints::findings::set_review_status),
        )
        .route("/audit", get(endpoints::audit::list))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::logging::log_request))
        .layer(axum::middleware::from_fn(middleware::auth::require_user))
        .layer(Extension(ctx));

    let public = Router::new().route("/health", get(endpoints::health::check));

    Router::new().nest("/api", protected.merge(public))
}
