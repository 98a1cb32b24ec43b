//! Evidence Validator: the only path from a `FindingDraft` to a `Finding`.
//!
//! Checks run in a fixed order and the first failure wins:
//! title, evidence presence, confidence range, severity, finding type,
//! source resolution, access, quote length, verbatim grounding.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use super::access;
use crate::config::PipelineConfig;
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingTitle,
    MissingEvidence,
    OutOfRangeConfidence,
    UnknownSeverity,
    UnknownFindingType,
    UnknownSource,
    /// The producing agent cited a document outside its Access Matrix entry.
    SourceNotAccessible,
    QuoteLength,
    UngroundedQuote,
    DisallowedLanguage,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTitle => "missing_title",
            Self::MissingEvidence => "missing_evidence",
            Self::OutOfRangeConfidence => "out_of_range_confidence",
            Self::UnknownSeverity => "unknown_severity",
            Self::UnknownFindingType => "unknown_finding_type",
            Self::UnknownSource => "unknown_source",
            Self::SourceNotAccessible => "source_not_accessible",
            Self::QuoteLength => "quote_length",
            Self::UngroundedQuote => "ungrounded_quote",
            Self::DisallowedLanguage => "disallowed_language",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}: {detail}", kind.as_str())]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub detail: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Only an access violation invalidates the whole invocation.
    pub fn is_fatal(&self) -> bool {
        self.kind == ValidationErrorKind::SourceNotAccessible
    }
}

/// Everything the validator needs to know about the job.
pub struct ValidationContext<'a> {
    pub job_id: &'a str,
    /// The job's documents, in job order.
    pub documents: &'a [Document],
    /// Already-accepted findings; cross-document citations must resolve to these.
    pub existing_findings: &'a [Finding],
}

pub struct EvidenceValidator {
    min_quote_chars: usize,
    max_quote_chars: usize,
}

impl EvidenceValidator {
    pub fn new(min_quote_chars: usize, max_quote_chars: usize) -> Self {
        Self {
            min_quote_chars,
            max_quote_chars,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.min_quote_chars, config.max_quote_chars)
    }

    /// `validate(finding_draft) -> Result<Finding, ValidationError>`.
    pub fn validate(
        &self,
        kind: AgentKind,
        draft: FindingDraft,
        ctx: &ValidationContext<'_>,
    ) -> Result<Finding, ValidationError> {
        use ValidationErrorKind::*;

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ValidationError::new(MissingTitle, "title is empty"));
        }

        let quote = draft.evidence_quote.as_deref().map(str::trim).unwrap_or_default();
        let source_ref = draft.source_document.as_deref().map(str::trim).unwrap_or_default();
        if quote.is_empty() {
            return Err(ValidationError::new(MissingEvidence, "evidence_quote is empty"));
        }
        if source_ref.is_empty() {
            return Err(ValidationError::new(MissingEvidence, "source_document is empty"));
        }

        let confidence = match draft.confidence {
            Some(c) if c.is_finite() && (0.0..=1.0).contains(&c) => c,
            Some(c) => {
                return Err(ValidationError::new(OutOfRangeConfidence, format!("confidence {c} outside [0, 1]")))
            }
            None => return Err(ValidationError::new(OutOfRangeConfidence, "confidence missing")),
        };

        let severity = draft
            .severity
            .as_deref()
            .and_then(Severity::parse_loose)
            .ok_or_else(|| {
                ValidationError::new(
                    UnknownSeverity,
                    format!("severity {:?} not in high|medium|low|info", draft.severity.as_deref().unwrap_or("")),
                )
            })?;

        let finding_type = normalize_finding_type(&draft.finding_type);
        if !finding_types_for(kind).contains(&finding_type.as_str()) {
            return Err(ValidationError::new(
                UnknownFindingType,
                format!("{finding_type:?} is not a {kind} finding type"),
            ));
        }

        let source = ctx
            .documents
            .iter()
            .find(|d| d.matches_reference(source_ref))
            .ok_or_else(|| ValidationError::new(UnknownSource, format!("{source_ref:?} is not part of this job")))?;

        if kind == AgentKind::CrossDocument {
            self.check_citations(&draft.citations, ctx)?;
        } else {
            if !access::can_read(kind, source) {
                return Err(ValidationError::new(
                    SourceNotAccessible,
                    format!("{kind} may not read {} document {}", source.category, source.id),
                ));
            }
            let len = quote.chars().count();
            if len < self.min_quote_chars || len > self.max_quote_chars {
                return Err(ValidationError::new(
                    QuoteLength,
                    format!(
                        "quote is {len} chars, expected {}-{}",
                        self.min_quote_chars, self.max_quote_chars
                    ),
                ));
            }
            if !is_verbatim_excerpt(quote, &source.content) {
                return Err(ValidationError::new(
                    UngroundedQuote,
                    format!("quote not found in {}", source.id),
                ));
            }
        }

        Ok(Finding {
            id: Uuid::new_v4().to_string(),
            job_id: ctx.job_id.to_string(),
            agent_kind: kind,
            finding_type,
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            evidence_quote: quote.to_string(),
            source_document: source.id.clone(),
            section_reference: draft
                .section_reference
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            confidence,
            severity,
            citations: draft.citations,
            metadata: draft.metadata,
            review_status: ReviewStatus::Unreviewed,
            flagged_for_review: false,
            reviewed_confidence: None,
            review_note: None,
            created_at: Utc::now(),
            reviewed_at: None,
        })
    }

    /// A cross-document finding may only restate evidence that already
    /// passed validation: every citation must be an existing finding's
    /// quote from that finding's source, and at least two distinct
    /// references are required.
    fn check_citations(&self, citations: &[Citation], ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        use ValidationErrorKind::*;

        let mut refs: Vec<(&str, Option<&str>)> = Vec::new();
        for c in citations {
            let grounded = ctx.existing_findings.iter().any(|f| {
                f.agent_kind.is_specialized() && f.source_document == c.source_document && f.evidence_quote == c.quote
            });
            if !grounded {
                return Err(ValidationError::new(
                    UngroundedQuote,
                    format!("citation from {} is not an existing finding's evidence", c.source_document),
                ));
            }
            let r = (c.source_document.as_str(), c.section_reference.as_deref());
            if !refs.contains(&r) {
                refs.push(r);
            }
        }
        if refs.len() < 2 {
            return Err(ValidationError::new(
                MissingEvidence,
                "cross-document finding needs at least two distinct source references",
            ));
        }
        Ok(())
    }
}

/// Fold case, curly quotes and dashes, and collapse whitespace.
fn normalize_for_match(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{00A0}' => ' ',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `quote` appears in `content`. An ellipsis in the quote marks an
/// elision: each segment must appear, in order.
pub fn is_verbatim_excerpt(quote: &str, content: &str) -> bool {
    let haystack = normalize_for_match(content);
    let quote = quote.replace('\u{2026}', "...");
    let segments: Vec<String> = quote
        .split("...")
        .map(|s| normalize_for_match(s).trim_matches(|c: char| c == ' ' || c == '"').to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return false;
    }

    let mut from = 0;
    for seg in &segments {
        match haystack[from..].find(seg.as_str()) {
            Some(pos) => from += pos + seg.len(),
            None => return false,
        }
    }
    true
}
