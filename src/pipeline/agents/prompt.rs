//! Shared pieces of agent prompts and contexts.

use crate::models::{AgentKind, Document, Finding};

/// First line of every agent prompt. Identifies the agent to the generator
/// and in captured prompts.
pub fn role_line(kind: AgentKind) -> String {
    format!("ROLE: {kind}")
}

/// The JSON shape every agent is asked to return, with agent-specific extras.
pub fn output_format(finding_types: &[&str], extra_fields: &[(&str, &str)]) -> String {
    let types = finding_types
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(" | ");
    let mut out = format!(
        "Return a JSON object {{\"findings\": [...]}}. Each finding must have this exact structure:\n\
{{\n\
    \"finding_type\": {types},\n\
    \"title\": \"Short descriptive title\",\n\
    \"description\": \"Detailed description of the finding\",\n\
    \"source_document\": \"the exact filename of the document this finding comes from\",\n\
    \"evidence_quote\": \"Exact quote copied verbatim from that document (10-500 characters)\",\n\
    \"section_reference\": \"Page, section, or agenda item reference\",\n"
    );
    for (name, description) in extra_fields {
        out.push_str(&format!("    \"{name}\": {description},\n"));
    }
    out.push_str(
        "    \"confidence\": 0.0 to 1.0,\n\
    \"severity\": \"high\" | \"medium\" | \"low\" | \"info\"\n\
}\n\
If there is nothing to report, return {\"findings\": []}.",
    );
    out
}

/// One delimited document block.
pub fn document_section(label: &str, doc: &Document) -> String {
    format!(
        "=== {label}: {title} (type: {category}) ===\n{content}\n=== END: {title} ===",
        title = doc.title,
        category = doc.category,
        content = doc.content.trim(),
    )
}

/// Blocks for every non-empty document, in order.
pub fn document_sections(label: &str, documents: &[&Document]) -> Vec<String> {
    documents
        .iter()
        .filter(|d| !d.content.trim().is_empty())
        .map(|d| document_section(label, d))
        .collect()
}

/// Titles of findings earlier agents produced, so later agents can avoid
/// duplicating them. Quotes are not repeated.
pub fn prior_findings_section(prior: &[Finding]) -> Option<String> {
    if prior.is_empty() {
        return None;
    }
    let lines: Vec<String> = prior
        .iter()
        .map(|f| {
            let section = f
                .section_reference
                .as_deref()
                .map(|s| format!(", {s}"))
                .unwrap_or_default();
            format!(
                "- [{}/{}] {} ({}{section}, severity {})",
                f.agent_kind, f.finding_type, f.title, f.source_document, f.severity
            )
        })
        .collect();
    Some(format!(
        "FINDINGS ALREADY RECORDED BY OTHER AGENTS (do not repeat them):\n{}",
        lines.join("\n")
    ))
}

/// Join document blocks and the optional prior-findings block.
pub fn assemble(sections: Vec<String>, prior: &[Finding]) -> Option<String> {
    if sections.is_empty() {
        return None;
    }
    let mut context = sections.join("\n\n");
    if let Some(block) = prior_findings_section(prior) {
        context.push_str("\n\n");
        context.push_str(&block);
    }
    Some(context)
}
