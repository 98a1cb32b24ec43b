use async_trait::async_trait;

use super::prompt;
use super::GovernanceAgent;
use crate::models::{finding_types_for, AgentKind, Document, Finding};
use crate::pipeline::safety::ViolationCategory;

/// Surfaces patterns around interests, relationships and recusals that may
/// warrant review. Its wording is screened for accusations as well as verdicts.
pub struct CoiDetector;

const INSTRUCTIONS: &str = "You are a Conflict of Interest Pattern Detector. Identify patterns \
in board minutes and disclosures that MAY warrant further review for potential conflicts of \
interest.\n\n\
CRITICAL CONSTRAINTS:\n\
- You detect PATTERNS ONLY. You NEVER make accusations or legal determinations.\n\
- Never say anyone \"is guilty of\", \"has a conflict of interest\", or acted \"illegally\". \
Use phrasing such as \"may warrant review\" or \"potential conflict of interest\".\n\
- Every finding must include an evidence quote copied verbatim from the source text.\n\n\
Look for:\n\
1. Related party signals: transactions or decisions involving parties that may be related \
to board members.\n\
2. Recusal patterns: board members who did or did not recuse themselves on matters \
touching their interests.\n\
3. Disclosure gaps: interests mentioned in minutes but absent from disclosures, or the \
reverse.\n\
4. Voting pattern signals: voting behavior that may suggest undisclosed interests.\n\n\
Severity:\n\
- high = strong pattern suggesting an undisclosed interest on a material matter\n\
- medium = moderate pattern worth discussing\n\
- low = minor pattern for awareness\n\
- info = general observation about disclosure practice";

#[async_trait]
impl GovernanceAgent for CoiDetector {
    fn kind(&self) -> AgentKind {
        AgentKind::CoiDetector
    }

    fn system_prompt(&self) -> String {
        format!(
            "{}\n\n{INSTRUCTIONS}\n\n{}",
            prompt::role_line(self.kind()),
            prompt::output_format(
                finding_types_for(self.kind()),
                &[(
                    "individuals_mentioned",
                    "[\"Names or roles of the people involved\"]"
                )],
            )
        )
    }

    fn build_context(&self, documents: &[&Document], prior: &[Finding]) -> Option<String> {
        prompt::assemble(prompt::document_sections("DOCUMENT", documents), prior)
    }

    fn screened_language(&self) -> &'static [ViolationCategory] {
        &[
            ViolationCategory::AccusatoryLanguage,
            ViolationCategory::ComplianceVerdict,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReviewStatus, Severity};
    use crate::pipeline::evidence::ValidationErrorKind;
    use chrono::Utc;

    fn finding(description: &str) -> Finding {
        Finding {
            id: "f".into(),
            job_id: "j".into(),
            agent_kind: AgentKind::CoiDetector,
            finding_type: "related_party_signal".into(),
            title: "Supplier contract".into(),
            description: description.into(),
            evidence_quote: "Director Lee abstained from the supplier vote".into(),
            source_document: "m1".into(),
            section_reference: None,
            confidence: 0.7,
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

    #[test]
    fn guilt_assertion_is_rewritten() {
        let screened = CoiDetector
            .screen(finding("Director Lee is guilty of steering the supplier contract."))
            .unwrap();
        assert_eq!(
            screened.description,
            "Director Lee may warrant review regarding steering the supplier contract."
        );
        assert!(!screened.description.to_lowercase().contains("guilty"));
        assert_eq!(
            screened.evidence_quote,
            "Director Lee abstained from the supplier vote"
        );
    }

    #[test]
    fn unrepairable_accusation_rejected() {
        let err = CoiDetector
            .screen(finding("The payment was a bribe and embezzlement and fraud and corruption."))
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::DisallowedLanguage);
    }

    #[test]
    fn neutral_wording_untouched() {
        let text = "The related party relationship may warrant review.";
        assert_eq!(CoiDetector.screen(finding(text)).unwrap().description, text);
    }

    #[test]
    fn minutes_screen_ignores_accusations() {
        use crate::pipeline::agents::MinutesAnalyzer;
        let mut f = finding("The vendor was guilty of late delivery.");
        f.agent_kind = AgentKind::MinutesAnalyzer;
        assert!(MinutesAnalyzer.screen(f).is_ok());
    }

    #[test]
    fn context_labels_every_document() {
        let minutes = Document::new("m", "Minutes.txt", crate::models::Category::Minutes, "a");
        let decl = Document::new("d", "Declarations.txt", crate::models::Category::Disclosure, "b");
        let ctx = CoiDetector.build_context(&[&minutes, &decl], &[]).unwrap();
        assert!(ctx.contains("=== DOCUMENT: Minutes.txt (type: minutes) ==="));
        assert!(ctx.contains("=== DOCUMENT: Declarations.txt (type: disclosure) ==="));
        assert!(CoiDetector.system_prompt().contains("\"individuals_mentioned\""));
    }
}
