//! Exercise classification: the opaque model boundary, the window ensemble and
//! a geometric fallback model.

mod ensemble;
mod heuristic;
mod tally;

pub use ensemble::{analyze_windows_detailed, classify_windows, VOTE_CONFIDENCE_THRESHOLD};
pub use heuristic::HeuristicClassifier;
pub use tally::VoteTally;

use crate::error::ClassifierError;
use crate::landmark::Frame;
use serde::{Deserialize, Serialize};

/// Label returned when the window shows no recognizable exercise
pub const NO_EXERCISE: &str = "no_exercise";
/// Label returned when the model cannot decide
pub const UNKNOWN: &str = "unknown";

/// Whether a label is one of the classifier sentinels
pub fn is_sentinel(label: &str) -> bool {
    label == NO_EXERCISE || label == UNKNOWN
}

/// One classifier opinion about a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVote {
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl ClassificationVote {
    pub fn new<S: Into<String>>(label: S, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn no_exercise(confidence: f64) -> Self {
        Self::new(NO_EXERCISE, confidence)
    }

    pub fn is_sentinel(&self) -> bool {
        is_sentinel(&self.label)
    }
}

/// Maps a window of frames to an exercise label.
///
/// Implementations hold no per-session state and are shared by every session,
/// so calls must be safe from several threads at once.
pub trait Classifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str {
        "classifier"
    }

    fn classify(&self, window: &[Frame]) -> Result<ClassificationVote, ClassifierError>;

    /// Confidence that `window` shows `exercise`, used once the exercise is known
    fn confidence_for(&self, window: &[Frame], exercise: &str) -> Result<f64, ClassifierError> {
        let vote = self.classify(window)?;
        Ok(if vote.label == exercise {
            vote.confidence
        } else {
            0.0
        })
    }
}

/// Pass/fail check of model artifacts, evaluated once before first use
pub trait ModelIntegrity: Send + Sync {
    fn model_name(&self) -> &str;

    fn verify(&self) -> bool;
}
