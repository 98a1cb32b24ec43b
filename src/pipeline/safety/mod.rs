//! Lexical screens for finding text.
//!
//! Titles and descriptions are screened; evidence quotes are verbatim source
//! text and are never rewritten. Violations are rephrased with deterministic
//! rules, the result rescanned, and anything still flagged is blocked.

pub mod keywords;
pub mod rephrase;
pub mod types;

pub use keywords::scan_language;
pub use types::*;

use rephrase::rephrase_violations;

/// More violations than this in one field are not worth rewriting.
const MAX_REPHRASE_VIOLATIONS: usize = 3;

/// Screen one field of text against the given categories.
pub fn screen_text(text: &str, categories: &[ViolationCategory]) -> ScreenOutcome {
    let violations = scan_language(text, categories);
    if violations.is_empty() {
        return ScreenOutcome::Clean;
    }

    if violations.len() > MAX_REPHRASE_VIOLATIONS {
        return log_outcome(ScreenOutcome::Blocked { violations });
    }

    let outcome = match rephrase_violations(text, &violations) {
        Some(rephrased) => {
            let remaining = scan_language(&rephrased, categories);
            if remaining.is_empty() {
                ScreenOutcome::Rephrased {
                    text: rephrased,
                    original_violations: violations,
                }
            } else {
                ScreenOutcome::Blocked { violations: remaining }
            }
        }
        None => ScreenOutcome::Blocked { violations },
    };
    log_outcome(outcome)
}

/// Log a screening outcome WITHOUT the screened text.
fn log_outcome(outcome: ScreenOutcome) -> ScreenOutcome {
    match &outcome {
        ScreenOutcome::Clean => {}
        ScreenOutcome::Rephrased { original_violations, .. } => {
            tracing::debug!(
                outcome = "rephrased",
                violation_count = original_violations.len(),
                categories = ?original_violations.iter().map(|v| v.category).collect::<Vec<_>>(),
                "Language screen: rephrased"
            );
        }
        ScreenOutcome::Blocked { violations } => {
            tracing::debug!(
                outcome = "blocked",
                violation_count = violations.len(),
                categories = ?violations.iter().map(|v| v.category).collect::<Vec<_>>(),
                "Language screen: blocked"
            );
        }
    }
    outcome
}

/// Short reason list for audit summaries, e.g. "Guilt assertion; Fraud allegation".
pub fn describe(violations: &[Violation]) -> String {
    let mut reasons: Vec<&str> = violations.iter().map(|v| v.reason.as_str()).collect();
    reasons.dedup();
    reasons.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COI: &[ViolationCategory] = &[
        ViolationCategory::AccusatoryLanguage,
        ViolationCategory::ComplianceVerdict,
    ];

    #[test]
    fn clean_text_passes() {
        assert_eq!(screen_text("Possible related-party relationship noted.", COI), ScreenOutcome::Clean);
    }

    #[test]
    fn repairable_text_rephrased() {
        match screen_text("Director A is guilty of not disclosing the lease.", COI) {
            ScreenOutcome::Rephrased { text, original_violations } => {
                assert_eq!(text, "Director A may warrant review regarding not disclosing the lease.");
                assert_eq!(original_violations.len(), 1);
            }
            other => panic!("Expected Rephrased, got {other:?}"),
        }
    }

    #[test]
    fn partially_repairable_text_blocked() {
        // "is guilty of" rewrites, "self-dealing" has no rule.
        let outcome = screen_text("Director A is guilty of self-dealing.", COI);
        match outcome {
            ScreenOutcome::Blocked { violations } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].matched_text, "self-dealing");
            }
            other => panic!("Expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn too_many_violations_blocked_without_rewrite() {
        let text = "Fraud, bribery, embezzlement and corruption everywhere.";
        assert!(screen_text(text, COI).is_blocked());
    }

    #[test]
    fn describe_joins_reasons() {
        let violations = scan_language("This is guilty of fraud", COI);
        assert_eq!(describe(&violations), "Guilt assertion: 'is guilty of'; Fraud allegation");
    }
}
