use super::state::{AnalysisSession, SessionPhase, SessionStats};
use crate::classifier::ClassificationVote;
use crate::diagnostics::DiagnosticVerdict;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NO_POSE_FEEDBACK: &str = "No person detected - step into the camera view";
pub const SETUP_FEEDBACK: &str = "Get ready - position yourself so your whole body is visible";
pub const CALIBRATING_FEEDBACK: &str = "Calibrating - start performing your exercise";
pub const LOW_VISIBILITY_FEEDBACK: &str =
    "Insufficient visibility - make sure your whole body is in view";
pub const NO_MOTION_FEEDBACK: &str = "No movement detected - please perform the exercise";

/// What a per-frame result reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    /// No body detected in the frame; nothing was buffered
    NoPose,
    Setup,
    /// Training buffer is still filling
    Buffering,
    Calibrating,
    /// A body is detected but not visible enough to judge
    LowVisibility,
    NoMotion,
    /// A diagnosis was produced
    Result,
}

/// Outcome of analyzing one frame in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub session_id: Uuid,
    pub status: FrameStatus,
    pub phase: SessionPhase,
    pub feedback: String,
    pub is_correct: bool,
    /// Confidence for results, progress in [0, 1] otherwise
    pub score: f64,
    pub buffered_frames: usize,
    pub required_frames: usize,
    pub exercise: Option<String>,
    pub confidence: Option<f64>,
    pub verdict: Option<DiagnosticVerdict>,
    /// Calibration vote cast on this frame
    pub vote: Option<ClassificationVote>,
    pub stats: SessionStats,
}

impl FrameResult {
    /// Result without a diagnosis, snapshotting the session's progress
    pub(crate) fn status(
        session: &AnalysisSession,
        status: FrameStatus,
        feedback: impl Into<String>,
        required_frames: usize,
    ) -> Self {
        Self {
            session_id: session.id(),
            status,
            phase: session.phase(),
            feedback: feedback.into(),
            is_correct: false,
            score: 0.0,
            buffered_frames: session.buffer().len(),
            required_frames,
            exercise: session.locked_exercise().map(str::to_string),
            confidence: None,
            verdict: None,
            vote: None,
            stats: session.stats(),
        }
    }

    pub(crate) fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Fraction of required frames buffered, capped at 1
    pub fn progress(&self) -> f64 {
        if self.required_frames == 0 {
            return 1.0;
        }
        (self.buffered_frames as f64 / self.required_frames as f64).min(1.0)
    }
}
