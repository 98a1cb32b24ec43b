//! Findings Reviewer: one deterministic self-correction pass per job.
//!
//! Everything is computed from the finding's original confidence and
//! evidence, so running the pass again over the same findings yields the
//! same result.

use crate::config::PipelineConfig;
use crate::models::{AgentKind, Finding, ReviewStatus, ReviewedFinding};
use crate::pipeline::safety::{scan_language, ViolationCategory};

/// Descriptions shorter than this lose clarity points.
const MIN_CLEAR_DESCRIPTION_CHARS: usize = 20;
const CLARITY_PENALTY: f64 = 0.1;

/// Scores how well a finding's evidence supports it, in [0, 1].
pub trait EvidenceScorer: Send + Sync {
    fn evidence_quality(&self, finding: &Finding) -> f64;
}

/// Quote length and specificity.
///
/// Length contributes up to 0.9 (full marks at `specific_quote_words`);
/// a quote naming something concrete (a number, or a capitalized word
/// other than the first) adds 0.1.
pub struct HeuristicEvidenceScorer {
    specific_quote_words: usize,
}

impl HeuristicEvidenceScorer {
    pub fn new(specific_quote_words: usize) -> Self {
        Self {
            specific_quote_words: specific_quote_words.max(1),
        }
    }

    fn quote_quality(&self, quote: &str) -> f64 {
        let words: Vec<&str> = quote.split_whitespace().collect();
        let length = (words.len() as f64 / self.specific_quote_words as f64).min(1.0);
        let specific = quote.chars().any(|c| c.is_ascii_digit())
            || words
                .iter()
                .skip(1)
                .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).starts_with(char::is_uppercase));
        0.9 * length + if specific { 0.1 } else { 0.0 }
    }
}

impl EvidenceScorer for HeuristicEvidenceScorer {
    /// A composite finding is only as strong as its weakest citation.
    fn evidence_quality(&self, finding: &Finding) -> f64 {
        if finding.citations.is_empty() {
            self.quote_quality(&finding.evidence_quote)
        } else {
            finding
                .citations
                .iter()
                .map(|c| self.quote_quality(&c.quote))
                .fold(1.0_f64, f64::min)
        }
    }
}

pub struct FindingsReviewer {
    scorer: Box<dyn EvidenceScorer>,
    threshold: f64,
    penalty: f64,
}

impl FindingsReviewer {
    pub fn new(scorer: Box<dyn EvidenceScorer>, threshold: f64, penalty: f64) -> Self {
        Self {
            scorer,
            threshold,
            penalty: penalty.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Box::new(HeuristicEvidenceScorer::new(config.specific_quote_words)),
            config.review_threshold,
            config.confidence_penalty,
        )
    }

    /// `review(findings) -> [ReviewedFinding]`, one per input, same order.
    pub fn review(&self, findings: &[Finding]) -> Vec<ReviewedFinding> {
        findings.iter().map(|f| self.review_one(f)).collect()
    }

    fn review_one(&self, finding: &Finding) -> ReviewedFinding {
        let quality = self.scorer.evidence_quality(finding).clamp(0.0, 1.0);
        let mut notes = Vec::new();

        // Confidence above what the evidence supports is pulled toward it.
        let mut reviewed = finding.confidence;
        if reviewed > quality {
            reviewed -= self.penalty * (reviewed - quality);
            notes.push(format!(
                "evidence quality {quality:.2} below stated confidence {:.2}",
                finding.confidence
            ));
        }

        if finding.description.trim().chars().count() < MIN_CLEAR_DESCRIPTION_CHARS {
            reviewed -= CLARITY_PENALTY;
            notes.push("description too brief".to_string());
        }
        let reviewed = round3(reviewed.clamp(0.0, 1.0));

        let tone_violation = finding.agent_kind == AgentKind::CoiDetector && {
            let text = format!("{} {}", finding.title, finding.description);
            !scan_language(&text, &[ViolationCategory::AccusatoryLanguage]).is_empty()
        };
        if tone_violation {
            notes.push("accusatory wording".to_string());
        }

        let flagged = reviewed < self.threshold || tone_violation;
        let review_status = if finding.review_status.is_human_decision() {
            finding.review_status
        } else if flagged {
            ReviewStatus::Flagged
        } else {
            ReviewStatus::Unreviewed
        };

        ReviewedFinding {
            finding_id: finding.id.clone(),
            evidence_quality: round3(quality),
            reviewed_confidence: reviewed,
            tone_violation,
            flagged_for_review: flagged,
            review_status,
            review_note: (!notes.is_empty()).then(|| notes.join("; ")),
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Citation, Severity};
    use chrono::Utc;

    fn finding(quote: &str, confidence: f64) -> Finding {
        Finding {
            id: "f1".into(),
            job_id: "j1".into(),
            agent_kind: AgentKind::MinutesAnalyzer,
            finding_type: "decision".into(),
            title: "Reserves policy adopted".into(),
            description: "The board adopted the revised reserves policy.".into(),
            evidence_quote: quote.into(),
            source_document: "m1".into(),
            section_reference: None,
            confidence,
            severity: Severity::Medium,
            citations: vec![],
            metadata: Default::default(),
            review_status: ReviewStatus::Unreviewed,
            flagged_for_review: false,
            reviewed_confidence: None,
            review_note: None,
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    fn reviewer() -> FindingsReviewer {
        FindingsReviewer::from_config(&PipelineConfig::default())
    }

    const STRONG_QUOTE: &str =
        "The board resolved to adopt the revised reserves policy with effect from 1 April 2024";

    #[test]
    fn high_confidence_one_word_quote_flagged() {
        let r = &reviewer().review(&[finding("Unanimously", 0.95)])[0];
        assert!(r.flagged_for_review);
        assert_eq!(r.review_status, ReviewStatus::Flagged);
        assert!(r.reviewed_confidence < 0.5);
        assert!(r.review_note.as_deref().unwrap().contains("evidence quality"));
    }

    #[test]
    fn strong_evidence_keeps_confidence() {
        let r = &reviewer().review(&[finding(STRONG_QUOTE, 0.9)])[0];
        assert_eq!(r.evidence_quality, 1.0);
        assert_eq!(r.reviewed_confidence, 0.9);
        assert!(!r.flagged_for_review);
        assert_eq!(r.review_status, ReviewStatus::Unreviewed);
        assert!(r.review_note.is_none());
    }

    #[test]
    fn low_stated_confidence_is_flagged_even_with_good_evidence() {
        let r = &reviewer().review(&[finding(STRONG_QUOTE, 0.3)])[0];
        assert_eq!(r.reviewed_confidence, 0.3);
        assert!(r.flagged_for_review);
    }

    #[test]
    fn specificity_counts() {
        let scorer = HeuristicEvidenceScorer::new(12);
        let plain = scorer.quote_quality("the board discussed the matter");
        let named = scorer.quote_quality("the board discussed Vendor matters");
        assert!(named > plain);
        assert!((scorer.quote_quality("budget of 40000") - (0.9 * 3.0 / 12.0 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn terse_description_penalized() {
        let mut f = finding(STRONG_QUOTE, 0.9);
        f.description = "Adopted.".into();
        let r = &reviewer().review(&[f])[0];
        assert_eq!(r.reviewed_confidence, 0.8);
        assert_eq!(r.review_note.as_deref(), Some("description too brief"));
    }

    #[test]
    fn coi_tone_violation_flags() {
        let mut f = finding(STRONG_QUOTE, 0.9);
        f.agent_kind = AgentKind::CoiDetector;
        f.description = "Director Lee committed fraud in the tender.".into();
        let r = &reviewer().review(&[f.clone()])[0];
        assert!(r.tone_violation);
        assert!(r.flagged_for_review);

        f.agent_kind = AgentKind::MinutesAnalyzer;
        assert!(!reviewer().review(&[f])[0].tone_violation);
    }

    #[test]
    fn human_decision_survives_review() {
        let mut f = finding("Unanimously", 0.95);
        f.review_status = ReviewStatus::Verified;
        let r = &reviewer().review(&[f])[0];
        assert!(r.flagged_for_review);
        assert_eq!(r.review_status, ReviewStatus::Verified);
    }

    #[test]
    fn review_is_idempotent() {
        let first = reviewer().review(&[finding("Unanimously", 0.95), finding(STRONG_QUOTE, 0.9)]);
        let mut reviewed: Vec<Finding> = vec![finding("Unanimously", 0.95), finding(STRONG_QUOTE, 0.9)];
        for (f, r) in reviewed.iter_mut().zip(&first) {
            f.reviewed_confidence = Some(r.reviewed_confidence);
            f.flagged_for_review = r.flagged_for_review;
            f.review_status = r.review_status;
        }
        assert_eq!(reviewer().review(&reviewed), first);
    }

    #[test]
    fn composite_uses_weakest_citation() {
        let mut f = finding("[m1] \"...\" | [m2] \"...\"", 0.9);
        f.citations = vec![
            Citation { source_document: "m1".into(), section_reference: None, quote: STRONG_QUOTE.into() },
            Citation { source_document: "m2".into(), section_reference: None, quote: "Deferred".into() },
        ];
        let q = HeuristicEvidenceScorer::new(12).evidence_quality(&f);
        assert!((q - 0.9 / 12.0).abs() < 1e-9);
    }
}
