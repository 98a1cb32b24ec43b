//! Generated output → `FindingDraft`s.
//!
//! Accepts a JSON array, an object with a `findings` array, or a single
//! finding object, optionally wrapped in markdown fences. Keys the agent
//! may not write are dropped here, before anything else sees them.

use serde_json::{Map, Value};

use super::AgentError;
use crate::models::{AgentKind, FindingDraft};
use crate::pipeline::access::{self, OutputField};

/// Locate the JSON payload inside model output.
pub fn extract_json_block(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    // Strip markdown code fences if present
    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') || block.starts_with('[') {
                return Some(block);
            }
        }
    }

    // Outermost array or object, whichever opens first
    let open = trimmed.find(|c: char| c == '[' || c == '{')?;
    let close_char = if trimmed[open..].starts_with('[') { ']' } else { '}' };
    let close = trimmed.rfind(close_char)?;
    (open < close).then(|| &trimmed[open..=close])
}

/// Parse model output for `kind` into drafts.
pub fn parse_drafts(kind: AgentKind, response: &str) -> Result<Vec<FindingDraft>, AgentError> {
    let block = extract_json_block(response)
        .ok_or_else(|| AgentError::UnparseableOutput("no JSON found in response".into()))?;
    let value: Value =
        serde_json::from_str(block).map_err(|e| AgentError::UnparseableOutput(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("findings") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(AgentError::UnparseableOutput("`findings` is not an array".into()));
            }
            None if obj.contains_key("title") => vec![Value::Object(obj)],
            None if obj.is_empty() => return Ok(Vec::new()),
            None => {
                return Err(AgentError::UnparseableOutput(
                    "object has neither `findings` nor a finding's `title`".into(),
                ));
            }
        },
        _ => return Err(AgentError::UnparseableOutput("expected a JSON array or object".into())),
    };

    let mut drafts = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => drafts.push(draft_from_object(kind, obj)),
            other => tracing::warn!(
                agent_kind = %kind,
                index,
                value_type = json_type(&other),
                "Skipping non-object finding"
            ),
        }
    }
    Ok(drafts)
}

fn draft_from_object(kind: AgentKind, obj: Map<String, Value>) -> FindingDraft {
    let mut draft = FindingDraft::default();
    let mut stripped = Vec::new();

    for (key, value) in obj {
        let Some(field) = OutputField::from_output_key(&key) else {
            tracing::debug!(agent_kind = %kind, key = %key, "Ignoring unknown output key");
            continue;
        };
        if !access::may_write(kind, field) {
            stripped.push(key);
            continue;
        }
        match field {
            OutputField::FindingType => draft.finding_type = as_text(&value).unwrap_or_default(),
            OutputField::Title => draft.title = as_text(&value).unwrap_or_default(),
            OutputField::Description => draft.description = as_text(&value).unwrap_or_default(),
            OutputField::EvidenceQuote => draft.evidence_quote = as_text(&value),
            OutputField::SourceDocument => draft.source_document = as_text(&value),
            OutputField::SectionReference => draft.section_reference = as_text(&value),
            OutputField::Confidence => draft.confidence = as_number(&value),
            OutputField::Severity => draft.severity = as_text(&value),
            OutputField::FrameworkReference | OutputField::IndividualsMentioned => {
                if !value.is_null() {
                    draft.metadata.insert(field.as_str().to_string(), value);
                }
            }
            // Citations, review fields and verdicts are never taken from model output.
            _ => stripped.push(key),
        }
    }

    if !stripped.is_empty() {
        tracing::warn!(
            agent_kind = %kind,
            fields = ?stripped,
            "Stripped output fields outside the agent's allowed set"
        );
    }
    draft
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Numbers, and numeric strings like "0.8". Anything else is `None` and
/// fails validation later as a missing confidence.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"{"finding_type":"procedural_gap","title":"Quorum not recorded",
        "description":"No quorum statement","evidence_quote":"Meeting opened at 6pm",
        "source_document":"Minutes_Feb.txt","section_reference":2,"confidence":"0.7",
        "severity":"medium","framework_reference":"Charter 3.1","compliant":false,
        "compliance_verdict":"non-compliant","individuals_mentioned":["A"]}"#;

    #[test]
    fn extract_json_block_from_fenced() {
        let text = "Here is the result:\n```json\n[{\"key\": \"value\"}]\n```\nDone.";
        assert_eq!(extract_json_block(text).unwrap(), "[{\"key\": \"value\"}]");
    }

    #[test]
    fn extract_json_block_from_bare() {
        let text = "Sure! [{\"a\": 1}] hope that helps";
        assert_eq!(extract_json_block(text).unwrap(), "[{\"a\": 1}]");
        assert!(extract_json_block("nothing here").is_none());
    }

    #[test]
    fn framework_output_drops_verdicts_and_foreign_fields() {
        let drafts = parse_drafts(AgentKind::FrameworkChecker, &format!("[{ONE}]")).unwrap();
        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.confidence, Some(0.7));
        assert_eq!(d.section_reference.as_deref(), Some("2"));
        assert_eq!(d.metadata.get("framework_reference").unwrap(), "Charter 3.1");
        assert!(!d.metadata.contains_key("individuals_mentioned"));
        assert!(!d.metadata.contains_key("compliance_verdict"));
        assert!(!d.metadata.contains_key("compliant"));
    }

    #[test]
    fn minutes_output_may_not_carry_framework_reference() {
        let drafts = parse_drafts(AgentKind::MinutesAnalyzer, ONE).unwrap();
        assert!(drafts[0].metadata.is_empty());
    }

    #[test]
    fn coi_keeps_individuals() {
        let drafts = parse_drafts(AgentKind::CoiDetector, &format!("{{\"findings\":[{ONE}]}}")).unwrap();
        assert_eq!(drafts[0].metadata["individuals_mentioned"], serde_json::json!(["A"]));
    }

    #[test]
    fn empty_and_odd_shapes() {
        assert!(parse_drafts(AgentKind::MinutesAnalyzer, "[]").unwrap().is_empty());
        assert!(parse_drafts(AgentKind::MinutesAnalyzer, "{\"findings\": []}").unwrap().is_empty());
        assert!(parse_drafts(AgentKind::MinutesAnalyzer, "{}").unwrap().is_empty());
        assert_eq!(parse_drafts(AgentKind::MinutesAnalyzer, "[1, {\"title\":\"x\"}]").unwrap().len(), 1);
        assert!(parse_drafts(AgentKind::MinutesAnalyzer, "[{broken").is_err());
        assert!(parse_drafts(AgentKind::MinutesAnalyzer, "{\"findings\": 3}").is_err());
    }

    #[test]
    fn object_without_findings_is_unparseable() {
        let err = parse_drafts(AgentKind::MinutesAnalyzer, "{\"note\": \"none\"}").unwrap_err();
        assert!(matches!(err, AgentError::UnparseableOutput(_)));
        let err = parse_drafts(AgentKind::CoiDetector, "```json\n{\"summary\": \"nothing found\"}\n```").unwrap_err();
        assert!(matches!(err, AgentError::UnparseableOutput(_)));
    }

    #[test]
    fn non_numeric_confidence_is_none() {
        let drafts =
            parse_drafts(AgentKind::MinutesAnalyzer, r#"[{"title":"x","confidence":"high"}]"#).unwrap();
        assert_eq!(drafts[0].confidence, None);
    }
}
