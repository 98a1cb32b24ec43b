use serde::Serialize;

/// Classification of language a finding must not carry.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum ViolationCategory {
    /// Asserts guilt or wrongdoing ("is guilty of", "committed fraud").
    AccusatoryLanguage,
    /// States a binary compliance determination ("is non-compliant").
    ComplianceVerdict,
}

/// A specific span that tripped a pattern.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Violation {
    pub category: ViolationCategory,
    /// The matched span. Never logged.
    pub matched_text: String,
    /// Byte offset in the screened text.
    pub offset: usize,
    /// Length of the matched span in bytes.
    pub length: usize,
    /// Human-readable explanation for the audit summary.
    pub reason: String,
}

/// What screening decided for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOutcome {
    /// No violations.
    Clean,
    /// Violations were rewritten away and the result rechecked clean.
    Rephrased {
        text: String,
        original_violations: Vec<Violation>,
    },
    /// Violations could not be repaired.
    Blocked { violations: Vec<Violation> },
}

impl ScreenOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}
