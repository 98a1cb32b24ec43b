//! Request logging middleware.
//!
//! Logs user, method, path and response status. Runs innermost, after the
//! identity middleware has injected the acting context.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::pipeline::collaborators::ActingContext;

pub async fn log_request(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<ActingContext>()
        .map(|c| c.user.clone())
        .unwrap_or_else(|| "-".into());

    let response = next.run(req).await;

    tracing::info!(
        user = %user,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "API request"
    );
    response
}
