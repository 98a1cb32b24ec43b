//! Specialized agents: Minutes Analyzer, Framework Checker, COI Detector.
//!
//! Each agent sees only the documents the orchestrator has already filtered
//! through the Access Matrix. An agent builds one request over its whole
//! document batch, calls the generator once, and returns unvalidated drafts.

pub mod coi;
pub mod framework;
pub mod minutes;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;

use super::evidence::{ValidationError, ValidationErrorKind};
use super::generation::{clean_response, GenerationError, Generator};
use super::safety::{self, ScreenOutcome, ViolationCategory};
use crate::models::{content_fingerprint, AgentKind, Document, Finding, FindingDraft};

pub use coi::CoiDetector;
pub use framework::FrameworkChecker;
pub use minutes::MinutesAnalyzer;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Unparseable agent output: {0}")]
    UnparseableOutput(String),
}

/// One prepared generator call.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub prompt: String,
    pub context: String,
    /// Fingerprint of prompt + context.
    pub input_hash: String,
}

impl AgentRequest {
    pub fn new(prompt: String, context: String) -> Self {
        let input_hash = content_fingerprint(&format!("{prompt}\n---\n{context}"));
        Self {
            prompt,
            context,
            input_hash,
        }
    }
}

#[async_trait]
pub trait GovernanceAgent: Send + Sync {
    fn kind(&self) -> AgentKind;

    /// Instructions sent as the generator's prompt.
    fn system_prompt(&self) -> String;

    /// Document text (and prior-finding summary) sent as context.
    /// `None` when there is nothing this agent can analyze.
    fn build_context(&self, documents: &[&Document], prior: &[Finding]) -> Option<String>;

    /// Language categories the agent's titles and descriptions are screened for.
    fn screened_language(&self) -> &'static [ViolationCategory];

    fn prepare(&self, documents: &[&Document], prior: &[Finding]) -> Option<AgentRequest> {
        let context = self.build_context(documents, prior)?;
        Some(AgentRequest::new(self.system_prompt(), context))
    }

    /// Call the generator and parse its output into drafts.
    async fn analyze(
        &self,
        generator: &dyn Generator,
        request: &AgentRequest,
    ) -> Result<Vec<FindingDraft>, AgentError> {
        let raw = generator.generate(&request.prompt, &request.context).await?;
        parse::parse_drafts(self.kind(), clean_response(&raw))
    }

    /// Post-hoc language check on a validated finding.
    fn screen(&self, finding: Finding) -> Result<Finding, ValidationError> {
        screen_finding(finding, self.screened_language())
    }
}

/// Rewrite repairable phrasing in a finding's title and description and
/// reject the rest. The evidence quote is never touched.
pub fn screen_finding(mut finding: Finding, categories: &[ViolationCategory]) -> Result<Finding, ValidationError> {
    for field in [&mut finding.title, &mut finding.description] {
        match safety::screen_text(field, categories) {
            ScreenOutcome::Clean => {}
            ScreenOutcome::Rephrased { text, .. } => *field = text,
            ScreenOutcome::Blocked { violations } => {
                return Err(ValidationError::new(
                    ValidationErrorKind::DisallowedLanguage,
                    safety::describe(&violations),
                ));
            }
        }
    }
    Ok(finding)
}

/// The document-reading agents in pipeline order.
pub fn specialized_agents() -> Vec<Box<dyn GovernanceAgent>> {
    AgentKind::SPECIALIZED
        .iter()
        .map(|kind| -> Box<dyn GovernanceAgent> {
            match kind {
                AgentKind::MinutesAnalyzer => Box::new(MinutesAnalyzer),
                AgentKind::FrameworkChecker => Box::new(FrameworkChecker),
                _ => Box::new(CoiDetector),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    struct Canned(&'static str);

    #[async_trait]
    impl Generator for Canned {
        async fn generate(&self, _prompt: &str, _context: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct Down;

    #[async_trait]
    impl Generator for Down {
        async fn generate(&self, _prompt: &str, _context: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Connection("http://localhost:11434".into()))
        }
    }

    fn minutes_doc() -> Document {
        Document::new("m1", "Minutes_Jan.txt", Category::Minutes, "The board approved the budget.")
    }

    #[test]
    fn agents_in_fixed_order() {
        let kinds: Vec<AgentKind> = specialized_agents().iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, AgentKind::SPECIALIZED.to_vec());
    }

    #[test]
    fn agent_is_object_safe() {
        fn _assert(_: &dyn GovernanceAgent) {}
    }

    #[test]
    fn request_hash_covers_prompt_and_context() {
        let a = AgentRequest::new("p".into(), "c1".into());
        let b = AgentRequest::new("p".into(), "c2".into());
        assert_ne!(a.input_hash, b.input_hash);
        assert_eq!(a.input_hash, AgentRequest::new("p".into(), "c1".into()).input_hash);
    }

    #[tokio::test]
    async fn analyze_parses_generator_output() {
        let doc = minutes_doc();
        let req = MinutesAnalyzer.prepare(&[&doc], &[]).unwrap();
        let out = MinutesAnalyzer
            .analyze(
                &Canned(r#"<think>hmm</think>```json
[{"finding_type":"decision","title":"Budget","description":"Approved","evidence_quote":"The board approved the budget","source_document":"Minutes_Jan.txt","confidence":0.9,"severity":"low"}]
```"#),
                &req,
            )
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Budget");
    }

    #[tokio::test]
    async fn generation_failure_is_agent_error() {
        let doc = minutes_doc();
        let req = MinutesAnalyzer.prepare(&[&doc], &[]).unwrap();
        let err = MinutesAnalyzer.analyze(&Down, &req).await.unwrap_err();
        assert!(matches!(err, AgentError::Generation(GenerationError::Connection(_))));
    }

    #[tokio::test]
    async fn prose_output_is_unparseable() {
        let doc = minutes_doc();
        let req = MinutesAnalyzer.prepare(&[&doc], &[]).unwrap();
        let err = MinutesAnalyzer
            .analyze(&Canned("I could not find anything notable."), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnparseableOutput(_)));
    }

    #[test]
    fn no_documents_no_request() {
        assert!(MinutesAnalyzer.prepare(&[], &[]).is_none());
    }
}
