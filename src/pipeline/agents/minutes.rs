use async_trait::async_trait;

use super::prompt;
use super::GovernanceAgent;
use crate::models::{finding_types_for, AgentKind, Document, Finding};
use crate::pipeline::safety::ViolationCategory;

/// Extracts decisions, action items, risks and voting records from minutes.
pub struct MinutesAnalyzer;

const INSTRUCTIONS: &str = "You are a Board Minutes Analyzer. Analyze board meeting minutes \
and extract structured governance information.\n\n\
CONSTRAINTS:\n\
- You can ONLY analyze the meeting minutes provided below.\n\
- Every finding must include an evidence quote copied verbatim from the source text.\n\
- Do not make legal or compliance determinations.\n\n\
Extract ALL of the following:\n\
1. Decisions: decisions made by the board, who proposed them and the outcome.\n\
2. Action items: assigned tasks with responsible party, deadline if mentioned, and status \
(state explicitly if the item is open, pending, carried forward, or completed).\n\
3. Risks: risks discussed, identified or flagged during the meeting.\n\
4. Voting records: formal votes with motion text, votes for/against/abstained, and result.\n\n\
Severity:\n\
- high = critical decisions, unresolved high risks, contentious votes\n\
- medium = important action items, moderate risks\n\
- low = routine decisions, minor items\n\
- info = general observations";

#[async_trait]
impl GovernanceAgent for MinutesAnalyzer {
    fn kind(&self) -> AgentKind {
        AgentKind::MinutesAnalyzer
    }

    fn system_prompt(&self) -> String {
        format!(
            "{}\n\n{INSTRUCTIONS}\n\n{}",
            prompt::role_line(self.kind()),
            prompt::output_format(finding_types_for(self.kind()), &[])
        )
    }

    fn build_context(&self, documents: &[&Document], prior: &[Finding]) -> Option<String> {
        prompt::assemble(prompt::document_sections("MEETING MINUTES", documents), prior)
    }

    fn screened_language(&self) -> &'static [ViolationCategory] {
        &[ViolationCategory::ComplianceVerdict]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use chrono::Utc;

    #[test]
    fn prompt_names_role_and_vocabulary() {
        let p = MinutesAnalyzer.system_prompt();
        assert!(p.starts_with("ROLE: minutes_analyzer"));
        assert!(p.contains("\"action_item\""));
        assert!(!p.contains("procedural_gap"));
    }

    #[test]
    fn context_includes_prior_titles_not_quotes() {
        let doc = Document::new("m1", "Minutes_Jan.txt", Category::Minutes, "Budget approved.");
        let prior = Finding {
            id: "f".into(),
            job_id: "j".into(),
            agent_kind: AgentKind::MinutesAnalyzer,
            finding_type: "decision".into(),
            title: "Budget approved".into(),
            description: String::new(),
            evidence_quote: "SECRET QUOTE TEXT".into(),
            source_document: "m1".into(),
            section_reference: Some("Item 2".into()),
            confidence: 0.9,
            severity: Severity::Low,
            citations: vec![],
            metadata: Default::default(),
            review_status: ReviewStatus::Unreviewed,
            flagged_for_review: false,
            reviewed_confidence: None,
            review_note: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        let ctx = MinutesAnalyzer.build_context(&[&doc], &[prior]).unwrap();
        assert!(ctx.contains("=== MEETING MINUTES: Minutes_Jan.txt"));
        assert!(ctx.contains("[minutes_analyzer/decision] Budget approved (m1, Item 2, severity low)"));
        assert!(!ctx.contains("SECRET QUOTE TEXT"));
    }

    #[test]
    fn verdict_language_rewritten() {
        let doc = Document::new("m1", "Minutes_Jan.txt", Category::Minutes, "x");
        let finding = Finding {
            id: "f".into(),
            job_id: "j".into(),
            agent_kind: AgentKind::MinutesAnalyzer,
            finding_type: "decision".into(),
            title: "Budget vote".into(),
            description: "The vote was compliant with the bylaws.".into(),
            evidence_quote: "quote".into(),
            source_document: doc.id.clone(),
            section_reference: None,
            confidence: 0.9,
            severity: Severity::Low,
            citations: vec![],
            metadata: Default::default(),
            review_status: ReviewStatus::Unreviewed,
            flagged_for_review: false,
            reviewed_confidence: None,
            review_note: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        let screened = MinutesAnalyzer.screen(finding).unwrap();
        assert_eq!(screened.description, "The vote appears consistent with the bylaws.");
    }
}
