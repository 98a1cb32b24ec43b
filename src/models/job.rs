use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{AgentKind, InvocationOutcome, JobStatus};

/// One analysis run over an ordered document set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Order is significant: it is the time order used by cross-document analysis.
    pub document_ids: Vec<String>,
    pub status: JobStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// JSON summary written on completion.
    pub summary: Option<String>,
    /// Human-readable reason when the job failed.
    pub error: Option<String>,
}

/// One call of a specialized agent within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInvocation {
    pub id: String,
    pub job_id: String,
    pub agent_kind: AgentKind,
    pub document_ids: Vec<String>,
    /// Fingerprint of prompt + context actually sent.
    pub input_hash: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: InvocationOutcome,
    pub error_detail: Option<String>,
}

/// What `get_job_status` returns to callers.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusReport {
    pub job: Job,
    pub invocations: Vec<InvocationSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvocationSummary {
    pub agent_kind: AgentKind,
    pub outcome: InvocationOutcome,
    pub error_detail: Option<String>,
}

impl From<&AgentInvocation> for InvocationSummary {
    fn from(inv: &AgentInvocation) -> Self {
        Self {
            agent_kind: inv.agent_kind,
            outcome: inv.outcome,
            error_detail: inv.error_detail.clone(),
        }
    }
}

/// Cap free-text error summaries before they are persisted.
pub fn truncate_summary(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX - 3).collect();
    format!("{cut}...")
}
