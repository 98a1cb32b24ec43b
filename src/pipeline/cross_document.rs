//! Cross-Document Analyzer: patterns across a job's accepted findings.
//!
//! Works on findings only, never on documents. Every draft it emits is
//! built from member findings' own evidence, so the validator can ground
//! each citation against an existing finding.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::config::PipelineConfig;
use crate::models::{Citation, Finding, FindingDraft, Severity};

/// Decides whether two findings describe the same issue.
///
/// Returns a score in [0, 1]; findings of different types must score 0.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &Finding, b: &Finding) -> f64;
}

/// Sørensen-Dice over normalized titles, gated on matching finding type.
pub struct TitleSimilarity;

impl SimilarityScorer for TitleSimilarity {
    fn score(&self, a: &Finding, b: &Finding) -> f64 {
        if a.finding_type != b.finding_type {
            return 0.0;
        }
        strsim::sorensen_dice(&normalize_title(&a.title), &normalize_title(&b.title))
    }
}

fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

static OPEN_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:outstanding|pending|overdue|deferred|carried\s+forward|still\s+open|remains?\s+open|not\s+(?:yet\s+)?(?:completed|done|resolved|delivered)|open)\b",
    )
    .expect("Invalid open-item regex")
});

static RESOLVED_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:completed|resolved|closed|done|delivered|fulfilled|finali[sz]ed)\b")
        .expect("Invalid resolved-item regex")
});

/// Whether the text of an action item says it is still open.
/// An item that says neither is treated as open.
fn reads_unresolved(finding: &Finding) -> bool {
    let text = format!("{} {} {}", finding.title, finding.description, finding.evidence_quote);
    OPEN_MARKERS.is_match(&text) || !RESOLVED_MARKERS.is_match(&text)
}

const GAP_TYPES: &[&str] = &[
    "procedural_gap",
    "documentation_gap",
    "policy_deviation",
    "best_practice_gap",
];

pub struct CrossDocumentAnalyzer {
    scorer: Box<dyn SimilarityScorer>,
    threshold: f64,
}

impl CrossDocumentAnalyzer {
    pub fn new(scorer: Box<dyn SimilarityScorer>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(Box::new(TitleSimilarity), config.similarity_threshold)
    }

    /// `detectPatterns(findings) -> [FindingDraft]`.
    ///
    /// `document_order` is the job's document order, oldest first. Only
    /// findings from the specialized agents are considered.
    pub fn detect_patterns(&self, findings: &[Finding], document_order: &[String]) -> Vec<FindingDraft> {
        let mut ordered: Vec<&Finding> = findings.iter().filter(|f| f.agent_kind.is_specialized()).collect();
        // Stable: within one document, agent output order stands in for time.
        ordered.sort_by_key(|f| doc_position(document_order, &f.source_document));

        let groups = self.group(&ordered);
        let drafts: Vec<FindingDraft> = groups
            .iter()
            .filter_map(|g| self.describe_group(g, document_order))
            .collect();

        tracing::debug!(
            considered = ordered.len(),
            groups = groups.len(),
            patterns = drafts.len(),
            "Cross-document analysis"
        );
        drafts
    }

    /// Join a finding to an existing group only when exactly one group
    /// matches. Ambiguous findings start their own group.
    fn group<'a>(&self, ordered: &[&'a Finding]) -> Vec<Vec<&'a Finding>> {
        let mut groups: Vec<Vec<&'a Finding>> = Vec::new();
        for &finding in ordered {
            let matches: Vec<usize> = groups
                .iter()
                .enumerate()
                .filter(|(_, g)| self.scorer.score(g[0], finding) >= self.threshold)
                .map(|(i, _)| i)
                .collect();
            match matches.as_slice() {
                [only] => groups[*only].push(finding),
                _ => groups.push(vec![finding]),
            }
        }
        groups
    }

    fn describe_group(&self, members: &[&Finding], document_order: &[String]) -> Option<FindingDraft> {
        let mut refs: Vec<(&str, Option<&str>)> = Vec::new();
        let mut docs: Vec<&str> = Vec::new();
        for f in members {
            let r = (f.source_document.as_str(), f.section_reference.as_deref());
            if !refs.contains(&r) {
                refs.push(r);
            }
            if !docs.contains(&r.0) {
                docs.push(r.0);
            }
        }
        if refs.len() < 2 {
            return None;
        }

        let lead = members[0];
        let last = members[members.len() - 1];

        let (finding_type, title) = if lead.finding_type == "action_item" && reads_unresolved(last) {
            ("unresolved_action_item", format!("Unresolved across meetings: {}", lead.title))
        } else if docs.len() < 2 {
            return None;
        } else if is_escalating(members, &docs) {
            ("escalating_theme", format!("Escalating: {}", lead.title))
        } else if GAP_TYPES.contains(&lead.finding_type.as_str()) {
            ("persistent_governance_gap", format!("Persistent gap: {}", lead.title))
        } else if lead.finding_type == "risk" {
            ("recurring_risk", format!("Recurring risk: {}", lead.title))
        } else {
            ("recurring_theme", format!("Recurring: {}", lead.title))
        };

        let places = refs
            .iter()
            .map(|(doc, section)| match section {
                Some(s) => format!("{doc} ({s})"),
                None => doc.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let description = format!(
            "Raised {} times across {} document(s): {places}. {}",
            members.len(),
            docs.len(),
            lead.description
        );

        let citations: Vec<Citation> = members
            .iter()
            .map(|f| Citation {
                source_document: f.source_document.clone(),
                section_reference: f.section_reference.clone(),
                quote: f.evidence_quote.clone(),
            })
            .collect();
        let evidence_quote = citations
            .iter()
            .map(|c| match &c.section_reference {
                Some(s) => format!("[{} §{}] \"{}\"", c.source_document, s, c.quote),
                None => format!("[{}] \"{}\"", c.source_document, c.quote),
            })
            .collect::<Vec<_>>()
            .join(" | ");

        let severity = members.iter().map(|f| f.severity).max().unwrap_or(Severity::Info);
        let confidence = members.iter().map(|f| f.confidence).fold(1.0_f64, f64::min);
        let earliest = docs
            .iter()
            .min_by_key(|d| doc_position(document_order, d))
            .copied()
            .unwrap_or(lead.source_document.as_str());

        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "member_findings".into(),
            json!(members.iter().map(|f| f.id.as_str()).collect::<Vec<_>>()),
        );

        Some(FindingDraft {
            finding_type: finding_type.into(),
            title,
            description,
            evidence_quote: Some(evidence_quote),
            source_document: Some(earliest.to_string()),
            section_reference: lead.section_reference.clone(),
            confidence: Some(confidence),
            severity: Some(severity.as_str().into()),
            citations,
            metadata,
        })
    }
}

fn doc_position(document_order: &[String], id: &str) -> usize {
    document_order.iter().position(|d| d == id).unwrap_or(usize::MAX)
}

/// Per-document peak severity never drops in document order and ends
/// higher than it started. `docs` is already in document order.
fn is_escalating(members: &[&Finding], docs: &[&str]) -> bool {
    let peaks: Vec<Severity> = docs
        .iter()
        .filter_map(|d| {
            members
                .iter()
                .filter(|f| f.source_document == *d)
                .map(|f| f.severity)
                .max()
        })
        .collect();
    peaks.windows(2).all(|w| w[0] <= w[1]) && peaks.first() < peaks.last()
}
