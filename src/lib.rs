pub mod api; // HTTP surface
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline; // Agents, evidence validation, cross-document analysis, review

use tracing_subscriber::EnvFilter;

/// Initialize tracing. `RUST_LOG` wins over the configured filter.
pub fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .try_init();
}
