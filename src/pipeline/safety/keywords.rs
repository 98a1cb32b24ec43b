use std::sync::LazyLock;

use regex::Regex;

use super::types::{Violation, ViolationCategory};

/// A compiled pattern with its violation metadata.
struct LanguagePattern {
    regex: Regex,
    category: ViolationCategory,
    description: &'static str,
}

/// Phrases that assert guilt, intent or wrongdoing about a person or body.
static ACCUSATORY_PATTERNS: LazyLock<Vec<LanguagePattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\b(?:is|are|was|were)\s+guilty\s+of\b",
            ViolationCategory::AccusatoryLanguage,
            "Guilt assertion: 'is guilty of'",
        ),
        pattern(
            r"(?i)\bguilty\b",
            ViolationCategory::AccusatoryLanguage,
            "Guilt assertion",
        ),
        pattern(
            r"(?i)\bcommitted\s+(?:fraud|a\s+crime|misconduct)\b",
            ViolationCategory::AccusatoryLanguage,
            "Wrongdoing assertion: 'committed fraud/misconduct'",
        ),
        pattern(
            r"(?i)\bfraud(?:ulent(?:ly)?)?\b",
            ViolationCategory::AccusatoryLanguage,
            "Fraud allegation",
        ),
        pattern(
            r"(?i)\bcorrupt(?:ion|ly)?\b",
            ViolationCategory::AccusatoryLanguage,
            "Corruption allegation",
        ),
        pattern(
            r"(?i)\b(?:clearly|knowingly|deliberately|intentionally)\s+(?:violated|breached|concealed|hid)\b",
            ViolationCategory::AccusatoryLanguage,
            "Intent attribution: 'knowingly violated'",
        ),
        pattern(
            r"(?i)\bacted\s+improperly\b",
            ViolationCategory::AccusatoryLanguage,
            "Misconduct assertion: 'acted improperly'",
        ),
        pattern(
            r"(?i)\b(?:illegal(?:ly)?|unlawful(?:ly)?)\b",
            ViolationCategory::AccusatoryLanguage,
            "Legal conclusion: 'illegal/unlawful'",
        ),
        pattern(
            r"(?i)\bself[- ]dealing\b",
            ViolationCategory::AccusatoryLanguage,
            "Misconduct label: 'self-dealing'",
        ),
        pattern(
            r"(?i)\bembezzl\w*",
            ViolationCategory::AccusatoryLanguage,
            "Embezzlement allegation",
        ),
        pattern(
            r"(?i)\bbrib(?:e|ed|es|ery)\b",
            ViolationCategory::AccusatoryLanguage,
            "Bribery allegation",
        ),
        pattern(
            r"(?i)\b(?:a|the)\s+conflict\s+of\s+interest\s+(?:exists|existed|is\s+present)\b",
            ViolationCategory::AccusatoryLanguage,
            "Definitive conflict: 'a conflict of interest exists'",
        ),
        pattern(
            r"(?i)\b(?:has|had)\s+a\s+conflict\s+of\s+interest\b",
            ViolationCategory::AccusatoryLanguage,
            "Definitive conflict: 'has a conflict of interest'",
        ),
        pattern(
            r"(?i)\bbreached\s+(?:their|his|her|its)\s+fiduciary\s+dut(?:y|ies)\b",
            ViolationCategory::AccusatoryLanguage,
            "Legal conclusion: 'breached fiduciary duty'",
        ),
    ]
});

/// Phrases that state a binary compliance determination.
static VERDICT_PATTERNS: LazyLock<Vec<LanguagePattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\b(?:is|are|was|were)\s+(?:not\s+|non-?)compliant\b",
            ViolationCategory::ComplianceVerdict,
            "Negative verdict: 'is non-compliant'",
        ),
        pattern(
            r"(?i)\b(?:is|are|was|were)\s+(?:fully\s+)?compliant\b",
            ViolationCategory::ComplianceVerdict,
            "Positive verdict: 'is compliant'",
        ),
        pattern(
            r"(?i)\bin\s+full\s+compliance\b",
            ViolationCategory::ComplianceVerdict,
            "Positive verdict: 'in full compliance'",
        ),
        pattern(
            r"(?i)\bcompliance\s+verdict\b",
            ViolationCategory::ComplianceVerdict,
            "Explicit verdict",
        ),
    ]
});

fn pattern(regex_str: &str, category: ViolationCategory, description: &'static str) -> LanguagePattern {
    LanguagePattern {
        regex: Regex::new(regex_str).expect("Invalid language regex pattern"),
        category,
        description,
    }
}

/// Scan `text` for every pattern in the requested categories.
pub fn scan_language(text: &str, categories: &[ViolationCategory]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (category, patterns) in [
        (ViolationCategory::AccusatoryLanguage, &*ACCUSATORY_PATTERNS),
        (ViolationCategory::ComplianceVerdict, &*VERDICT_PATTERNS),
    ] {
        if !categories.contains(&category) {
            continue;
        }
        for lp in patterns {
            for mat in lp.regex.find_iter(text) {
                violations.push(Violation {
                    category: lp.category,
                    matched_text: mat.as_str().to_string(),
                    offset: mat.start(),
                    length: mat.len(),
                    reason: lp.description.to_string(),
                });
            }
        }
    }

    deduplicate_violations(&mut violations);

    violations
}

/// Remove overlapping violations, keeping the more specific (longer) match.
pub fn deduplicate_violations(violations: &mut Vec<Violation>) {
    violations.sort_by_key(|v| (v.offset, std::cmp::Reverse(v.length)));
    let mut i = 0;
    while i < violations.len() {
        let mut j = i + 1;
        while j < violations.len() {
            let vi_end = violations[i].offset + violations[i].length;
            let vj_end = violations[j].offset + violations[j].length;
            if violations[j].offset >= violations[i].offset && vj_end <= vi_end {
                violations.remove(j);
            } else {
                j += 1;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCUSATORY: &[ViolationCategory] = &[ViolationCategory::AccusatoryLanguage];
    const VERDICT: &[ViolationCategory] = &[ViolationCategory::ComplianceVerdict];

    #[test]
    fn guilty_of_detected_once() {
        let v = scan_language("The director is guilty of self-dealing.", ACCUSATORY);
        // "is guilty of" swallows the bare "guilty" match; "self-dealing" is separate.
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].matched_text, "is guilty of");
    }

    #[test]
    fn neutral_coi_language_passes() {
        let text = "Director A may have a relationship with Vendor X that warrants review; \
                    no recusal is recorded for item 4.";
        assert!(scan_language(text, ACCUSATORY).is_empty());
    }

    #[test]
    fn potential_conflict_is_not_definitive() {
        assert!(scan_language("She has a potential conflict of interest", ACCUSATORY).is_empty());
        assert!(!scan_language("She has a conflict of interest", ACCUSATORY).is_empty());
    }

    #[test]
    fn verdicts_detected() {
        assert!(!scan_language("The board is non-compliant with the charter.", VERDICT).is_empty());
        assert!(!scan_language("The committee was not compliant.", VERDICT).is_empty());
        assert!(!scan_language("Procedures are fully compliant.", VERDICT).is_empty());
        assert!(!scan_language("Operating in full compliance with policy.", VERDICT).is_empty());
    }

    #[test]
    fn gap_description_is_not_a_verdict() {
        let text = "The charter requires annual evaluation; no evaluation is recorded in 2025 minutes.";
        assert!(scan_language(text, VERDICT).is_empty());
    }

    #[test]
    fn categories_are_respected() {
        assert!(scan_language("The board is non-compliant.", ACCUSATORY).is_empty());
        assert!(scan_language("This was fraudulent.", VERDICT).is_empty());
    }

    #[test]
    fn dedup_keeps_longest() {
        let mut v = vec![
            Violation {
                category: ViolationCategory::AccusatoryLanguage,
                matched_text: "guilty".into(),
                offset: 3,
                length: 6,
                reason: String::new(),
            },
            Violation {
                category: ViolationCategory::AccusatoryLanguage,
                matched_text: "is guilty of".into(),
                offset: 0,
                length: 12,
                reason: String::new(),
            },
        ];
        deduplicate_violations(&mut v);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].length, 12);
    }
}
