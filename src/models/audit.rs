use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{AgentKind, AuditAction};

/// A single write-once audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    /// None for system-level entries.
    pub job_id: Option<String>,
    /// None for orchestrator-level entries.
    pub agent_kind: Option<AgentKind>,
    pub action: AuditAction,
    pub input_hash: Option<String>,
    pub output_summary: String,
    pub timestamp: DateTime<Utc>,
}

/// An audit record before it has been assigned an id and timestamp.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub job_id: Option<String>,
    pub agent_kind: Option<AgentKind>,
    pub action: AuditAction,
    pub input_hash: Option<String>,
    pub output_summary: String,
}

impl NewAuditEntry {
    pub fn for_job(job_id: &str, action: AuditAction, output_summary: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.to_string()),
            agent_kind: None,
            action,
            input_hash: None,
            output_summary: output_summary.into(),
        }
    }

    pub fn agent(mut self, kind: AgentKind) -> Self {
        self.agent_kind = Some(kind);
        self
    }

    pub fn input_hash(mut self, hash: impl Into<String>) -> Self {
        self.input_hash = Some(hash.into());
        self
    }
}
