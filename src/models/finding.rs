use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{AgentKind, ReviewStatus, Severity};

/// One quoted excerpt backing a cross-document finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub source_document: String,
    pub section_reference: Option<String>,
    pub quote: String,
}

/// Unvalidated finding as produced by an agent or the cross-document analyzer.
///
/// Everything that came from generated output stays loosely typed here;
/// the evidence validator is the only way to turn a draft into a `Finding`.
///
/// The producing agent is supplied by the caller of the validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingDraft {
    pub finding_type: String,
    pub title: String,
    pub description: String,
    pub evidence_quote: Option<String>,
    pub source_document: Option<String>,
    pub section_reference: Option<String>,
    pub confidence: Option<f64>,
    pub severity: Option<String>,
    /// Non-empty only for cross-document drafts.
    pub citations: Vec<Citation>,
    /// Agent-specific extras (framework_reference, individuals_mentioned).
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Finding types each producer may emit.
pub fn finding_types_for(kind: AgentKind) -> &'static [&'static str] {
    match kind {
        AgentKind::MinutesAnalyzer => &["decision", "action_item", "risk", "voting_record"],
        AgentKind::FrameworkChecker => &[
            "procedural_gap",
            "documentation_gap",
            "policy_deviation",
            "best_practice_gap",
        ],
        AgentKind::CoiDetector => &[
            "related_party_signal",
            "recusal_pattern",
            "disclosure_gap",
            "voting_pattern_signal",
        ],
        AgentKind::CrossDocument => &[
            "recurring_risk",
            "recurring_theme",
            "persistent_governance_gap",
            "unresolved_action_item",
            "escalating_theme",
        ],
        AgentKind::Reviewer => &[],
    }
}

/// Lowercase, with spaces and hyphens folded to underscores.
pub fn normalize_finding_type(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// A validated, persisted finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub job_id: String,
    pub agent_kind: AgentKind,
    pub finding_type: String,
    pub title: String,
    pub description: String,
    pub evidence_quote: String,
    /// Document id (resolved from whatever reference the agent used).
    pub source_document: String,
    pub section_reference: Option<String>,
    /// Confidence as stated by the producer. Never rewritten.
    pub confidence: f64,
    pub severity: Severity,
    pub citations: Vec<Citation>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub review_status: ReviewStatus,
    pub flagged_for_review: bool,
    /// Set by the reviewer pass.
    pub reviewed_confidence: Option<f64>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Finding {
    /// Confidence after review if there has been one.
    pub fn effective_confidence(&self) -> f64 {
        self.reviewed_confidence.unwrap_or(self.confidence)
    }

    /// Every document this finding rests on, primary source first.
    pub fn source_documents(&self) -> Vec<&str> {
        let mut out = vec![self.source_document.as_str()];
        for c in &self.citations {
            if !out.contains(&c.source_document.as_str()) {
                out.push(c.source_document.as_str());
            }
        }
        out
    }
}

/// Outcome of the reviewer pass for one finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewedFinding {
    pub finding_id: String,
    pub evidence_quality: f64,
    pub reviewed_confidence: f64,
    pub tone_violation: bool,
    pub flagged_for_review: bool,
    pub review_status: ReviewStatus,
    pub review_note: Option<String>,
}

/// Counts by severity, rendered into audit summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn tally<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut counts = Self::default();
        for f in findings {
            match f.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.info
    }
}

impl std::fmt::Display for SeverityCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "high={} medium={} low={} info={}",
            self.high, self.medium, self.low, self.info
        )
    }
}
