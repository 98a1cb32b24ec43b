use thiserror::Error;

use super::collaborators::DocumentError;
use crate::db::DatabaseError;
use crate::models::JobStatus;

/// Errors surfaced by the orchestrator's exposed interfaces.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("{user} is not permitted to {action}")]
    PermissionDenied { user: String, action: &'static str },

    #[error("{user} may not access document {document_id}")]
    DocumentNotAccessible { user: String, document_id: String },

    #[error("A job needs at least one document")]
    EmptyJob,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Finding not found: {0}")]
    FindingNotFound(String),

    #[error("Cannot move job from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// Every agent invocation for the job errored.
    #[error("Job {job_id} failed: {summary}")]
    JobFailure { job_id: String, summary: String },
}
