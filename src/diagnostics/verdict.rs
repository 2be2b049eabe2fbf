use crate::landmark::Side;
use serde::{Deserialize, Serialize};

pub const MOVEMENT_CORRECT: &str = "Movement correct";
pub const NO_DATA_PROVIDED: &str = "No data provided";
pub const NO_SPECIFIC_ANALYSIS: &str = "No specific analysis available";
pub const NO_MOVEMENT_DETECTED: &str = "No movement detected";

/// Detail attached to a violated rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueDetail {
    Flag(bool),
    /// Side annotation such as `"L"`, `"R"` or `"L, R"`
    Sides(String),
}

impl IssueDetail {
    /// Annotation for the given sides; `None` when no side is affected
    pub fn for_sides(sides: &[Side]) -> Option<Self> {
        let has_left = sides.contains(&Side::Left);
        let has_right = sides.contains(&Side::Right);
        match (has_left, has_right) {
            (true, true) => Some(Self::Sides("L, R".to_string())),
            (true, false) => Some(Self::Sides(Side::Left.tag().to_string())),
            (false, true) => Some(Self::Sides(Side::Right.tag().to_string())),
            (false, false) => None,
        }
    }

    pub fn side(side: Side) -> Self {
        Self::Sides(side.tag().to_string())
    }
}

impl std::fmt::Display for IssueDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueDetail::Flag(flag) => write!(f, "{}", flag),
            IssueDetail::Sides(sides) => write!(f, "{}", sides),
        }
    }
}

/// One violated rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub condition: String,
    pub detail: IssueDetail,
}

/// Feedback attached to a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Feedback {
    /// Sentinel for a movement without any violated rule
    Correct,
    /// Free-text explanation
    Message(String),
    /// Every violated rule, in rule-table order
    Issues(Vec<Issue>),
}

impl Feedback {
    /// Detail of a violated rule by exact name
    pub fn issue(&self, condition: &str) -> Option<&IssueDetail> {
        match self {
            Feedback::Issues(issues) => issues
                .iter()
                .find(|issue| issue.condition == condition)
                .map(|issue| &issue.detail),
            _ => None,
        }
    }

    /// True when the message or any rule name contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Feedback::Correct => MOVEMENT_CORRECT.contains(needle),
            Feedback::Message(message) => message.contains(needle),
            Feedback::Issues(issues) => issues.iter().any(|issue| issue.condition.contains(needle)),
        }
    }

    /// Single-line human-readable rendering
    pub fn summary(&self) -> String {
        match self {
            Feedback::Correct => MOVEMENT_CORRECT.to_string(),
            Feedback::Message(message) => message.clone(),
            Feedback::Issues(issues) => issues
                .iter()
                .map(|issue| match &issue.detail {
                    IssueDetail::Flag(_) => issue.condition.clone(),
                    IssueDetail::Sides(sides) => format!("{} ({})", issue.condition, sides),
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Pass/fail outcome of one diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticVerdict {
    pub is_correct: bool,
    pub feedback: Feedback,
}

impl DiagnosticVerdict {
    pub fn correct() -> Self {
        Self {
            is_correct: true,
            feedback: Feedback::Correct,
        }
    }

    pub fn message<S: Into<String>>(is_correct: bool, message: S) -> Self {
        Self {
            is_correct,
            feedback: Feedback::Message(message.into()),
        }
    }

    /// Verdict from accumulated rule violations; no violations means correct
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        if issues.is_empty() {
            Self::correct()
        } else {
            Self {
                is_correct: false,
                feedback: Feedback::Issues(issues),
            }
        }
    }
}
