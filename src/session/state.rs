use crate::classifier::VoteTally;
use crate::frame_buffer::FrameBuffer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Stage of the real-time analysis state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// The user gets into position; frames are buffered only
    Setup,
    /// Confident classifications are collected as votes
    Calibrating,
    /// The exercise is fixed and every full window is diagnosed
    Training,
}

/// Per-session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub frames_seen: u64,
    /// Frames without a detected pose
    pub frames_rejected: u64,
    pub votes_cast: u64,
    pub calibration_restarts: u64,
    pub diagnoses: u64,
}

/// Mutable state of one user's analysis session.
///
/// Owned by exactly one caller; the engine only ever borrows it for the
/// duration of a call.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    phase: SessionPhase,
    phase_started: Instant,
    pub(crate) buffer: FrameBuffer,
    pub(crate) votes: VoteTally,
    pub(crate) locked_exercise: Option<String>,
    default_exercise: Option<String>,
    pub(crate) stats: SessionStats,
}

impl AnalysisSession {
    pub fn new(default_exercise: Option<String>, buffer_capacity: usize, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            phase: SessionPhase::Setup,
            phase_started: now,
            buffer: FrameBuffer::new(buffer_capacity),
            votes: VoteTally::new(),
            locked_exercise: None,
            default_exercise,
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Time spent in the current phase
    pub fn phase_elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.phase_started)
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn votes(&self) -> &VoteTally {
        &self.votes
    }

    pub fn locked_exercise(&self) -> Option<&str> {
        self.locked_exercise.as_deref()
    }

    pub fn default_exercise(&self) -> Option<&str> {
        self.default_exercise.as_deref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Enter `phase`, restarting the phase clock; returns the previous phase
    pub(crate) fn enter_phase(&mut self, phase: SessionPhase, now: Instant) -> SessionPhase {
        let previous = self.phase;
        self.phase = phase;
        self.phase_started = now;
        previous
    }

    /// Return to setup with an empty buffer, no votes and no locked exercise.
    ///
    /// The id, default exercise and counters are kept.
    pub(crate) fn reset(&mut self, now: Instant) {
        self.buffer.clear();
        self.votes.clear();
        self.locked_exercise = None;
        self.enter_phase(SessionPhase::Setup, now);
    }
}
