use serde::Deserialize;

use super::enums::{AgentKind, AuditAction, ReviewStatus, Severity};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FindingFilter {
    pub job_id: Option<String>,
    pub agent_kind: Option<AgentKind>,
    pub severity: Option<Severity>,
    pub review_status: Option<ReviewStatus>,
    pub flagged: Option<bool>,
}

impl FindingFilter {
    pub fn for_job(job_id: &str) -> Self {
        Self {
            job_id: Some(job_id.to_string()),
            ..Self::default()
        }
    }
}

/// Default page size for audit queries.
pub const DEFAULT_AUDIT_LIMIT: u32 = 100;
/// Hard cap for audit queries.
pub const MAX_AUDIT_LIMIT: u32 = 500;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditFilter {
    pub job_id: Option<String>,
    pub agent_kind: Option<AgentKind>,
    pub action: Option<AuditAction>,
    pub limit: Option<u32>,
}

impl AuditFilter {
    pub fn for_job(job_id: &str) -> Self {
        Self {
            job_id: Some(job_id.to_string()),
            ..Self::default()
        }
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, MAX_AUDIT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_limit_defaults_and_caps() {
        assert_eq!(AuditFilter::default().effective_limit(), 100);
        let big = AuditFilter { limit: Some(10_000), ..Default::default() };
        assert_eq!(big.effective_limit(), 500);
        let zero = AuditFilter { limit: Some(0), ..Default::default() };
        assert_eq!(zero.effective_limit(), 1);
    }

    #[test]
    fn finding_filter_deserializes_query_values() {
        let f: FindingFilter =
            serde_json::from_str(r#"{"agent_kind":"coi_detector","flagged":true}"#).unwrap();
        assert_eq!(f.agent_kind, Some(AgentKind::CoiDetector));
        assert_eq!(f.flagged, Some(true));
        assert!(f.job_id.is_none());
    }
}
