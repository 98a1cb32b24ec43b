use async_trait::async_trait;

use super::prompt;
use super::GovernanceAgent;
use crate::models::{finding_types_for, AgentKind, Category, Document, Finding};
use crate::pipeline::safety::ViolationCategory;

/// Compares board practice in minutes against the organization's own
/// policies and governance framework. Reports gaps, never verdicts.
pub struct FrameworkChecker;

const INSTRUCTIONS: &str = "You are a Governance Framework Checker. Compare board practices \
documented in meeting minutes against the organization's own governance framework and \
policies.\n\n\
CONSTRAINTS:\n\
- You analyze ONLY the minutes and framework documents provided below.\n\
- Compare against the organization's OWN policies, not external standards.\n\
- Never state that the board or anyone is compliant or non-compliant. Describe observed \
gaps and possible deviations only.\n\
- Every finding must include an evidence quote copied verbatim from the source text.\n\n\
Look for:\n\
1. Procedural gaps: required procedures not followed (quorum, notice periods, voting \
thresholds).\n\
2. Documentation gaps: required documentation missing from the minutes.\n\
3. Policy deviations: actions that appear to deviate from stated policies.\n\
4. Best practice gaps: governance practices below the organization's stated standards.\n\n\
Severity:\n\
- high = clear procedural deviation on a material matter\n\
- medium = documentation gap or minor procedural issue\n\
- low = best practice suggestion\n\
- info = general observation";

const NO_FRAMEWORK_NOTE: &str = "[No explicit framework or policy documents were provided. \
Assess the minutes against generally expected board procedure and report only clear \
procedural or documentation gaps.]";

#[async_trait]
impl GovernanceAgent for FrameworkChecker {
    fn kind(&self) -> AgentKind {
        AgentKind::FrameworkChecker
    }

    fn system_prompt(&self) -> String {
        format!(
            "{}\n\n{INSTRUCTIONS}\n\n{}",
            prompt::role_line(self.kind()),
            prompt::output_format(
                finding_types_for(self.kind()),
                &[(
                    "framework_reference",
                    "\"The specific policy or framework clause being compared against\""
                )],
            )
        )
    }

    /// Minutes first, then the framework and policy texts they are compared
    /// against. Without minutes there is no practice to check.
    fn build_context(&self, documents: &[&Document], prior: &[Finding]) -> Option<String> {
        let (minutes, reference): (Vec<&Document>, Vec<&Document>) = documents
            .iter()
            .copied()
            .partition(|d| d.category == Category::Minutes);

        let mut sections = prompt::document_sections("MEETING MINUTES", &minutes);
        if sections.is_empty() {
            return None;
        }
        let framework = prompt::document_sections("FRAMEWORK DOCUMENT", &reference);
        if framework.is_empty() {
            sections.push(NO_FRAMEWORK_NOTE.to_string());
        } else {
            sections.extend(framework);
        }
        prompt::assemble(sections, prior)
    }

    fn screened_language(&self) -> &'static [ViolationCategory] {
        &[ViolationCategory::ComplianceVerdict]
    }
}
