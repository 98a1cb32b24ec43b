//! HTTP surface over the orchestrator's exposed interfaces.
//!
//! Routes are nested under `/api/`. Every route except the health check
//! requires an `X-Acting-User` header naming a configured user.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ApiSession};
pub use types::ApiContext;
