//! Access Matrix: which document categories each agent may read and which
//! output fields it may write. Fixed at build time.

use crate::models::{AgentKind, Category, Document};

/// Output fields an agent may populate on a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputField {
    FindingType,
    Title,
    Description,
    EvidenceQuote,
    SourceDocument,
    SectionReference,
    Confidence,
    Severity,
    FrameworkReference,
    IndividualsMentioned,
    Citations,
    ReviewedConfidence,
    ReviewStatus,
    FlaggedForReview,
    ReviewNote,
    /// Binary compliance determination. No agent may write it.
    ComplianceVerdict,
}

impl OutputField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindingType => "finding_type",
            Self::Title => "title",
            Self::Description => "description",
            Self::EvidenceQuote => "evidence_quote",
            Self::SourceDocument => "source_document",
            Self::SectionReference => "section_reference",
            Self::Confidence => "confidence",
            Self::Severity => "severity",
            Self::FrameworkReference => "framework_reference",
            Self::IndividualsMentioned => "individuals_mentioned",
            Self::Citations => "citations",
            Self::ReviewedConfidence => "reviewed_confidence",
            Self::ReviewStatus => "review_status",
            Self::FlaggedForReview => "flagged_for_review",
            Self::ReviewNote => "review_note",
            Self::ComplianceVerdict => "compliance_verdict",
        }
    }

    /// Map a key found in generated output to the field it would populate.
    pub fn from_output_key(key: &str) -> Option<Self> {
        let field = match key {
            "finding_type" | "type" => Self::FindingType,
            "title" => Self::Title,
            "description" => Self::Description,
            "evidence_quote" | "quote" => Self::EvidenceQuote,
            "source_document" | "source" => Self::SourceDocument,
            "section_reference" | "section" => Self::SectionReference,
            "confidence" => Self::Confidence,
            "severity" => Self::Severity,
            "framework_reference" => Self::FrameworkReference,
            "individuals_mentioned" => Self::IndividualsMentioned,
            "citations" => Self::Citations,
            "reviewed_confidence" => Self::ReviewedConfidence,
            "review_status" => Self::ReviewStatus,
            "flagged_for_review" => Self::FlaggedForReview,
            "review_note" => Self::ReviewNote,
            "compliance_verdict" | "compliant" | "is_compliant" | "verdict" | "compliance_status" => {
                Self::ComplianceVerdict
            }
            _ => return None,
        };
        Some(field)
    }
}

const CORE_FIELDS: [OutputField; 8] = [
    OutputField::FindingType,
    OutputField::Title,
    OutputField::Description,
    OutputField::EvidenceQuote,
    OutputField::SourceDocument,
    OutputField::SectionReference,
    OutputField::Confidence,
    OutputField::Severity,
];

const MINUTES_FIELDS: &[OutputField] = &CORE_FIELDS;

const FRAMEWORK_FIELDS: &[OutputField] = &[
    OutputField::FindingType,
    OutputField::Title,
    OutputField::Description,
    OutputField::EvidenceQuote,
    OutputField::SourceDocument,
    OutputField::SectionReference,
    OutputField::Confidence,
    OutputField::Severity,
    OutputField::FrameworkReference,
];

const COI_FIELDS: &[OutputField] = &[
    OutputField::FindingType,
    OutputField::Title,
    OutputField::Description,
    OutputField::EvidenceQuote,
    OutputField::SourceDocument,
    OutputField::SectionReference,
    OutputField::Confidence,
    OutputField::Severity,
    OutputField::IndividualsMentioned,
];

const CROSS_DOCUMENT_FIELDS: &[OutputField] = &[
    OutputField::FindingType,
    OutputField::Title,
    OutputField::Description,
    OutputField::EvidenceQuote,
    OutputField::SourceDocument,
    OutputField::SectionReference,
    OutputField::Confidence,
    OutputField::Severity,
    OutputField::Citations,
];

const REVIEWER_FIELDS: &[OutputField] = &[
    OutputField::ReviewedConfidence,
    OutputField::ReviewStatus,
    OutputField::FlaggedForReview,
    OutputField::ReviewNote,
];

/// `allowedCategories(agentKind)`. Cross-document and reviewer read findings,
/// never documents.
pub fn allowed_categories(kind: AgentKind) -> &'static [Category] {
    match kind {
        AgentKind::MinutesAnalyzer => &[Category::Minutes],
        AgentKind::FrameworkChecker => &[Category::Minutes, Category::Policy, Category::Framework],
        AgentKind::CoiDetector => &[Category::Minutes, Category::Disclosure],
        AgentKind::CrossDocument | AgentKind::Reviewer => &[],
    }
}

/// `allowedOutputFields(agentKind)`.
pub fn allowed_output_fields(kind: AgentKind) -> &'static [OutputField] {
    match kind {
        AgentKind::MinutesAnalyzer => MINUTES_FIELDS,
        AgentKind::FrameworkChecker => FRAMEWORK_FIELDS,
        AgentKind::CoiDetector => COI_FIELDS,
        AgentKind::CrossDocument => CROSS_DOCUMENT_FIELDS,
        AgentKind::Reviewer => REVIEWER_FIELDS,
    }
}

pub fn may_write(kind: AgentKind, field: OutputField) -> bool {
    allowed_output_fields(kind).contains(&field)
}

/// `canRead(agentKind, document)`. Returns false instead of failing.
pub fn can_read(kind: AgentKind, document: &Document) -> bool {
    can_read_category(kind, document.category)
}

pub fn can_read_category(kind: AgentKind, category: Category) -> bool {
    allowed_categories(kind).contains(&category)
}

/// The subset of `documents` the agent may see, in input order.
pub fn filter_readable<'a>(kind: AgentKind, documents: &'a [Document]) -> Vec<&'a Document> {
    documents.iter().filter(|d| can_read(kind, d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(category: Category) -> Document {
        Document::new("d", "d.txt", category, "text")
    }

    #[test]
    fn policy_table() {
        use Category::*;
        let expect = [
            (AgentKind::MinutesAnalyzer, vec![Minutes]),
            (AgentKind::FrameworkChecker, vec![Minutes, Policy, Framework]),
            (AgentKind::CoiDetector, vec![Minutes, Disclosure]),
            (AgentKind::CrossDocument, vec![]),
            (AgentKind::Reviewer, vec![]),
        ];
        for (kind, categories) in expect {
            for c in Category::all() {
                assert_eq!(can_read(kind, &doc(*c)), categories.contains(c), "{kind} / {c}");
            }
        }
    }

    #[test]
    fn other_category_unreadable_by_everyone() {
        for kind in AgentKind::all() {
            assert!(!can_read(*kind, &doc(Category::Other)));
        }
    }

    #[test]
    fn no_agent_may_write_a_verdict() {
        for kind in AgentKind::all() {
            assert!(!may_write(*kind, OutputField::ComplianceVerdict));
        }
    }

    #[test]
    fn agent_specific_fields() {
        assert!(may_write(AgentKind::FrameworkChecker, OutputField::FrameworkReference));
        assert!(!may_write(AgentKind::MinutesAnalyzer, OutputField::FrameworkReference));
        assert!(may_write(AgentKind::CoiDetector, OutputField::IndividualsMentioned));
        assert!(!may_write(AgentKind::FrameworkChecker, OutputField::IndividualsMentioned));
        assert!(may_write(AgentKind::CrossDocument, OutputField::Citations));
        assert!(!may_write(AgentKind::Reviewer, OutputField::EvidenceQuote));
        assert!(!may_write(AgentKind::Reviewer, OutputField::SourceDocument));
    }

    #[test]
    fn verdict_keys_recognized() {
        for key in ["compliance_verdict", "compliant", "is_compliant", "verdict"] {
            assert_eq!(OutputField::from_output_key(key), Some(OutputField::ComplianceVerdict));
        }
        assert_eq!(OutputField::from_output_key("colour"), None);
    }

    #[test]
    fn filter_keeps_input_order() {
        let docs = vec![
            Document::new("a", "a", Category::Disclosure, "x"),
            Document::new("b", "b", Category::Minutes, "x"),
            Document::new("c", "c", Category::Policy, "x"),
        ];
        let ids: Vec<&str> = filter_readable(AgentKind::CoiDetector, &docs).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
