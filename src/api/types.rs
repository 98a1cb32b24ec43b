//! Shared state for the API layer.

use std::sync::Arc;

use crate::pipeline::Orchestrator;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub orchestrator: Arc<Orchestrator>,
}

impl ApiContext {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Header carrying the caller's identity, resolved by the access policy.
pub const ACTING_USER_HEADER: &str = "X-Acting-User";
