use std::sync::LazyLock;

use regex::Regex;

use super::types::{Violation, ViolationCategory};

/// Deterministic rewrite toward neutral, observational wording.
struct RephraseRule {
    /// Pattern to find the violating text.
    pattern: Regex,
    /// Replacement template ($1, $2 for capture groups).
    replacement: &'static str,
    /// Which violation category this rule addresses.
    category: ViolationCategory,
}

static REPHRASE_RULES: LazyLock<Vec<RephraseRule>> = LazyLock::new(|| {
    vec![
        // --- Accusatory → warrants review ---
        RephraseRule {
            pattern: Regex::new(r"(?i)\b(?:is|are|was|were)\s+guilty\s+of\b").unwrap(),
            replacement: "may warrant review regarding",
            category: ViolationCategory::AccusatoryLanguage,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\b(a|the)\s+conflict\s+of\s+interest\s+(?:exists|existed|is\s+present)\b").unwrap(),
            replacement: "$1 potential conflict of interest may warrant review",
            category: ViolationCategory::AccusatoryLanguage,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\b(has|had)\s+a\s+conflict\s+of\s+interest\b").unwrap(),
            replacement: "$1 a potential conflict of interest",
            category: ViolationCategory::AccusatoryLanguage,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\b(?:clearly|knowingly|deliberately|intentionally)\s+(violated|breached|concealed|hid)\b").unwrap(),
            replacement: "may have $1",
            category: ViolationCategory::AccusatoryLanguage,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\bacted\s+improperly\b").unwrap(),
            replacement: "took actions that may warrant review",
            category: ViolationCategory::AccusatoryLanguage,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\bbreached\s+(their|his|her|its)\s+fiduciary\s+dut(y|ies)\b").unwrap(),
            replacement: "may warrant review of $1 fiduciary dut$2",
            category: ViolationCategory::AccusatoryLanguage,
        },

        // --- Verdict → gap observation ---
        RephraseRule {
            pattern: Regex::new(r"(?i)\b(?:is|are|was|were)\s+(?:not\s+|non-?)compliant\s+with\b").unwrap(),
            replacement: "shows a possible gap relative to",
            category: ViolationCategory::ComplianceVerdict,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\b(?:is|are|was|were)\s+(?:fully\s+)?compliant\s+with\b").unwrap(),
            replacement: "appears consistent with",
            category: ViolationCategory::ComplianceVerdict,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\bin\s+full\s+compliance\s+with\b").unwrap(),
            replacement: "consistent with",
            category: ViolationCategory::ComplianceVerdict,
        },
        RephraseRule {
            pattern: Regex::new(r"(?i)\bcompliance\s+verdict\b").unwrap(),
            replacement: "gap observation",
            category: ViolationCategory::ComplianceVerdict,
        },
    ]
});

/// Attempt to rephrase violations out of the text.
/// Returns `Some(rephrased)` if at least one rule applied, `None` if no rules could fix it.
/// The caller must rescan the result: a rule may leave other violations in place.
pub fn rephrase_violations(text: &str, violations: &[Violation]) -> Option<String> {
    if violations.is_empty() {
        return Some(text.to_string());
    }

    let mut result = text.to_string();
    let mut applied_count = 0;

    for violation in violations {
        for rule in REPHRASE_RULES.iter().filter(|r| r.category == violation.category) {
            let before = result.clone();
            result = rule.pattern.replace_all(&result, rule.replacement).to_string();
            if result != before {
                applied_count += 1;
                break; // One rule applied per violation
            }
        }
    }

    if applied_count == 0 {
        return None;
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::safety::keywords::scan_language;

    fn rephrase(text: &str, category: ViolationCategory) -> Option<String> {
        let violations = scan_language(text, &[category]);
        rephrase_violations(text, &violations)
    }

    #[test]
    fn guilty_of_becomes_warrants_review() {
        let out = rephrase("Director B is guilty of undisclosed interests.", ViolationCategory::AccusatoryLanguage)
            .unwrap();
        assert_eq!(out, "Director B may warrant review regarding undisclosed interests.");
        assert!(scan_language(&out, &[ViolationCategory::AccusatoryLanguage]).is_empty());
    }

    #[test]
    fn definitive_conflict_softened() {
        let out = rephrase("Director C has a conflict of interest in item 5.", ViolationCategory::AccusatoryLanguage)
            .unwrap();
        assert_eq!(out, "Director C has a potential conflict of interest in item 5.");
    }

    #[test]
    fn negative_verdict_becomes_gap() {
        let out = rephrase("The process is non-compliant with the charter.", ViolationCategory::ComplianceVerdict)
            .unwrap();
        assert_eq!(out, "The process shows a possible gap relative to the charter.");
    }

    #[test]
    fn no_rule_for_fraud() {
        assert!(rephrase("This was fraudulent.", ViolationCategory::AccusatoryLanguage).is_none());
    }

    #[test]
    fn clean_text_unchanged() {
        assert_eq!(rephrase_violations("Quorum confirmed.", &[]), Some("Quorum confirmed.".into()));
    }
}
