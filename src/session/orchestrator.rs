use super::motion::has_significant_motion;
use super::result::{
    FrameResult, FrameStatus, CALIBRATING_FEEDBACK, LOW_VISIBILITY_FEEDBACK, NO_MOTION_FEEDBACK,
    NO_POSE_FEEDBACK, SETUP_FEEDBACK,
};
use super::state::{AnalysisSession, SessionPhase};
use crate::classifier::Classifier;
use crate::config::SessionConfig;
use crate::diagnostics::{diagnose, display_name};
use crate::error::ClassifierError;
use crate::events::{EngineEvent, EventBus};
use crate::pose::PoseObservation;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Drives one session through setup, calibration and training.
///
/// Borrows the shared classifier and configuration for a single call; all
/// mutable state lives in the session.
pub struct SessionOrchestrator<'a> {
    classifier: &'a dyn Classifier,
    config: &'a SessionConfig,
    events: &'a EventBus,
}

impl<'a> SessionOrchestrator<'a> {
    pub fn new(
        classifier: &'a dyn Classifier,
        config: &'a SessionConfig,
        events: &'a EventBus,
    ) -> Self {
        Self {
            classifier,
            config,
            events,
        }
    }

    /// Analyze one pose observation at time `now`
    pub fn process(
        &self,
        session: &mut AnalysisSession,
        observation: PoseObservation,
        now: Instant,
    ) -> Result<FrameResult, ClassifierError> {
        session.stats.frames_seen += 1;
        self.advance_phase(session, now);

        let Some(frame) = observation.frame else {
            session.stats.frames_rejected += 1;
            trace!("Session {}: no pose in frame", session.id());
            return Ok(FrameResult::status(session, FrameStatus::NoPose, NO_POSE_FEEDBACK, 0));
        };

        session.buffer.push(frame, observation.is_visible);

        match session.phase() {
            SessionPhase::Setup => {
                let progress = self.phase_progress(session, now, self.config.setup_duration_ms);
                Ok(
                    FrameResult::status(session, FrameStatus::Setup, SETUP_FEEDBACK, 0)
                        .with_score(progress),
                )
            }
            SessionPhase::Calibrating => self.calibrate(session, now),
            SessionPhase::Training => self.train(session),
        }
    }

    /// Apply time-driven phase transitions
    fn advance_phase(&self, session: &mut AnalysisSession, now: Instant) {
        if session.phase() == SessionPhase::Setup
            && session.phase_elapsed(now) >= self.config.setup_duration()
        {
            self.transition(session, SessionPhase::Calibrating, now);
        }

        if session.phase() == SessionPhase::Calibrating
            && session.phase_elapsed(now) >= self.config.calibration_duration()
        {
            self.enter_training(session, now);
        }
    }

    /// Lock the exercise from votes or the default, or restart calibration
    fn enter_training(&self, session: &mut AnalysisSession, now: Instant) {
        let voted = session.votes.winner().map(|(label, _)| label.to_string());
        let (exercise, from_votes) = match (voted, session.default_exercise()) {
            (Some(label), _) => (label, true),
            (None, Some(default)) => (default.to_string(), false),
            (None, None) => {
                warn!(
                    "Session {}: calibration ended without votes or a default exercise, restarting",
                    session.id()
                );
                session.votes.clear();
                session.stats.calibration_restarts += 1;
                session.enter_phase(SessionPhase::Calibrating, now);
                self.events.notify(EngineEvent::CalibrationRestarted {
                    session_id: session.id(),
                    timestamp: Utc::now(),
                });
                return;
            }
        };

        info!(
            "Session {}: locked to {} ({} of {} votes)",
            session.id(),
            exercise,
            session.votes.count(&exercise),
            session.votes.total()
        );
        session.locked_exercise = Some(exercise.clone());
        self.transition(session, SessionPhase::Training, now);
        self.events.notify(EngineEvent::ExerciseLocked {
            session_id: session.id(),
            exercise,
            from_votes,
            timestamp: Utc::now(),
        });
    }

    fn transition(&self, session: &mut AnalysisSession, to: SessionPhase, now: Instant) {
        let from = session.enter_phase(to, now);
        info!("Session {}: {:?} -> {:?}", session.id(), from, to);
        self.events.notify(EngineEvent::PhaseChanged {
            session_id: session.id(),
            from,
            to,
            timestamp: Utc::now(),
        });
    }

    fn calibrate(
        &self,
        session: &mut AnalysisSession,
        now: Instant,
    ) -> Result<FrameResult, ClassifierError> {
        let config = self.config;
        let window_size = config.calibration_window;
        let progress = self.phase_progress(session, now, config.calibration_duration_ms);
        let mut result = FrameResult::status(
            session,
            FrameStatus::Calibrating,
            CALIBRATING_FEEDBACK,
            window_size,
        )
        .with_score(progress);

        let frame_count = session.buffer.stats().frames_pushed;
        if session.buffer.len() < window_size
            || frame_count % config.prediction_interval.max(1) != 0
        {
            return Ok(result);
        }

        let visibility = session.buffer.recent_visibility_ratio(window_size);
        if visibility < config.visibility_threshold {
            trace!(
                "Session {}: calibration skipped, visibility {:.2}",
                session.id(),
                visibility
            );
            return Ok(result);
        }

        let motion_frames = session
            .buffer
            .recent(window_size.max(config.min_motion_samples));
        if !has_significant_motion(
            &motion_frames,
            config.motion_threshold,
            config.min_motion_samples,
        ) {
            trace!("Session {}: calibration skipped, no motion", session.id());
            return Ok(result);
        }

        let window = session.buffer.recent(window_size);
        let vote = self.classifier.classify(&window)?;
        if vote.confidence < config.calibration_confidence || vote.is_sentinel() {
            debug!(
                "Session {}: calibration vote rejected: {} ({:.2})",
                session.id(),
                vote.label,
                vote.confidence
            );
            return Ok(result);
        }

        debug!(
            "Session {}: calibration vote {} ({:.2})",
            session.id(),
            vote.label,
            vote.confidence
        );
        session.votes.add(&vote.label);
        session.stats.votes_cast += 1;
        self.events.notify(EngineEvent::CalibrationVote {
            session_id: session.id(),
            label: vote.label.clone(),
            confidence: vote.confidence,
            timestamp: Utc::now(),
        });

        result.stats = session.stats();
        result.vote = Some(vote);
        Ok(result)
    }

    fn train(&self, session: &mut AnalysisSession) -> Result<FrameResult, ClassifierError> {
        let config = self.config;
        let window_size = config.training_window;

        let Some(exercise) = session.locked_exercise.clone() else {
            // Training is only entered with a locked exercise
            return Ok(FrameResult::status(
                session,
                FrameStatus::Calibrating,
                CALIBRATING_FEEDBACK,
                config.calibration_window,
            ));
        };

        if session.buffer.len() < window_size {
            let result = FrameResult::status(
                session,
                FrameStatus::Buffering,
                format!(
                    "Collecting frames ({}/{})",
                    session.buffer.len(),
                    window_size
                ),
                window_size,
            );
            let progress = result.progress();
            return Ok(result.with_score(progress));
        }

        let visibility = session.buffer.recent_visibility_ratio(window_size);
        if visibility < config.visibility_threshold {
            return Ok(FrameResult::status(
                session,
                FrameStatus::LowVisibility,
                LOW_VISIBILITY_FEEDBACK,
                window_size,
            )
            .with_score(visibility));
        }

        let motion_frames = session
            .buffer
            .recent(window_size.max(config.min_motion_samples));
        if !has_significant_motion(
            &motion_frames,
            config.motion_threshold,
            config.min_motion_samples,
        ) {
            return Ok(FrameResult::status(
                session,
                FrameStatus::NoMotion,
                NO_MOTION_FEEDBACK,
                window_size,
            ));
        }

        let window = session.buffer.recent(window_size);
        let confidence = self.classifier.confidence_for(&window, &exercise)?;
        let verdict = diagnose(&exercise, &window, None);
        session.stats.diagnoses += 1;

        let trusted = confidence >= config.training_confidence;
        let is_correct = trusted && verdict.is_correct;
        let feedback = if trusted {
            verdict.feedback.summary()
        } else {
            format!(
                "Low confidence ({:.0}%) that you are performing {}; form not confirmed. {}",
                confidence * 100.0,
                display_name(&exercise),
                verdict.feedback.summary()
            )
        };

        debug!(
            "Session {}: {} diagnosed, correct={} confidence={:.2}",
            session.id(),
            exercise,
            is_correct,
            confidence
        );
        self.events.notify(EngineEvent::DiagnosisCompleted {
            session_id: session.id(),
            exercise: exercise.clone(),
            is_correct,
            confidence,
            timestamp: Utc::now(),
        });

        let mut result = FrameResult::status(session, FrameStatus::Result, feedback, window_size)
            .with_score(confidence);
        result.is_correct = is_correct;
        result.confidence = Some(confidence);
        result.verdict = Some(verdict);
        Ok(result)
    }

    /// Fraction of a phase duration elapsed, capped at 1
    fn phase_progress(&self, session: &AnalysisSession, now: Instant, duration_ms: u64) -> f64 {
        if duration_ms == 0 {
            return 1.0;
        }
        let elapsed = session.phase_elapsed(now).as_secs_f64() * 1000.0;
        (elapsed / duration_ms as f64).min(1.0)
    }
}
