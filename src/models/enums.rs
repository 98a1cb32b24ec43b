use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        $(#[$meta])*
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Category {
    Minutes => "minutes",
    Policy => "policy",
    Framework => "framework",
    Disclosure => "disclosure",
    Other => "other",
});

impl Category {
    /// Best-effort category from a file name, used by the CLI ingest path.
    pub fn infer_from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("minutes") {
            Self::Minutes
        } else if lower.contains("disclosure") || lower.contains("declaration") {
            Self::Disclosure
        } else if lower.contains("framework") || lower.contains("charter") {
            Self::Framework
        } else if lower.contains("policy") || lower.contains("policies") {
            Self::Policy
        } else {
            Self::Other
        }
    }
}

str_enum!(AgentKind {
    MinutesAnalyzer => "minutes_analyzer",
    FrameworkChecker => "framework_checker",
    CoiDetector => "coi_detector",
    CrossDocument => "cross_document",
    Reviewer => "reviewer",
});

impl AgentKind {
    /// Document-reading agents, in the fixed pipeline order.
    pub const SPECIALIZED: [AgentKind; 3] = [
        AgentKind::MinutesAnalyzer,
        AgentKind::FrameworkChecker,
        AgentKind::CoiDetector,
    ];

    pub fn is_specialized(&self) -> bool {
        Self::SPECIALIZED.contains(self)
    }
}

str_enum!(
    #[derive(PartialOrd, Ord)]
    Severity {
        Info => "info",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

impl Severity {
    /// Case-insensitive parse used on generated output.
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

str_enum!(ReviewStatus {
    Unreviewed => "unreviewed",
    Verified => "verified",
    Disputed => "disputed",
    Flagged => "flagged",
});

impl ReviewStatus {
    /// Verified and disputed are only ever written by a person.
    pub fn is_human_decision(&self) -> bool {
        matches!(self, Self::Verified | Self::Disputed)
    }
}

str_enum!(JobStatus {
    Pending => "pending",
    Running => "running",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Allowed job lifecycle edges.
pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (Pending, Running)
            | (Pending, Cancelled)
            | (Running, Completed)
            | (Running, Failed)
            | (Running, Cancelled)
    )
}

str_enum!(InvocationOutcome {
    Running => "running",
    Success => "success",
    Error => "error",
});

str_enum!(AuditAction {
    JobStarted => "job_started",
    AgentSkipped => "agent_skipped",
    AgentCompleted => "agent_completed",
    AgentFailed => "agent_failed",
    AccessViolation => "access_violation",
    FindingRejected => "finding_rejected",
    InvocationDiscarded => "invocation_discarded",
    CrossDocumentCompleted => "cross_document_completed",
    ReviewCompleted => "review_completed",
    JobCompleted => "job_completed",
    JobFailed => "job_failed",
    JobCancelled => "job_cancelled",
    ReviewStatusChanged => "review_status_changed",
});
