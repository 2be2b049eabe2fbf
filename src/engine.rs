//! The movement-analysis service object.
//!
//! An [`Engine`] is built once, holds the shared classifier, configuration and
//! event bus, and is then used by reference for every session and video. It
//! carries no per-session state: callers own their [`AnalysisSession`]s.

use crate::classifier::{Classifier, ModelIntegrity};
use crate::config::FormcheckConfig;
use crate::diagnostics::ExerciseKind;
use crate::error::{ClassifierError, FormcheckError, Result};
use crate::events::{EngineEvent, EventBus, EventFilter, EventReceiver};
use crate::landmark::Frame;
use crate::pose::PoseObservation;
use crate::session::{AnalysisSession, FrameResult, SessionOrchestrator};
use crate::video::{VideoAnalysis, VideoAnalysisPipeline};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Builder for [`Engine`]
pub struct EngineBuilder {
    config: Option<FormcheckConfig>,
    classifier: Option<Arc<dyn Classifier>>,
    integrity_checks: Vec<Arc<dyn ModelIntegrity>>,
    event_bus: Option<EventBus>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            classifier: None,
            integrity_checks: Vec::new(),
            event_bus: None,
        }
    }

    /// Set the configuration (defaults when omitted)
    pub fn with_config(mut self, config: FormcheckConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the classifier shared by every session
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Add a model integrity gate evaluated by `build`
    pub fn with_integrity_check(mut self, check: Arc<dyn ModelIntegrity>) -> Self {
        self.integrity_checks.push(check);
        self
    }

    /// Publish on an existing event bus instead of creating one from the config
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Validate the configuration, run every integrity gate and build the engine
    pub fn build(self) -> Result<Engine> {
        let classifier = self
            .classifier
            .ok_or_else(|| FormcheckError::component("engine", "Classifier is required"))?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        for check in &self.integrity_checks {
            if !check.verify() {
                error!("Integrity check failed for model {}", check.model_name());
                return Err(ClassifierError::IntegrityCheckFailed {
                    model: check.model_name().to_string(),
                }
                .into());
            }
            debug!("Integrity check passed for model {}", check.model_name());
        }

        let events = self.event_bus.unwrap_or_else(|| {
            if config.events.debug_logging {
                EventBus::with_debug_logging(config.events.capacity)
            } else {
                EventBus::new(config.events.capacity)
            }
        });

        info!("Analysis engine ready with {} classifier", classifier.name());

        Ok(Engine {
            config,
            classifier,
            events,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Engine {
    config: FormcheckConfig,
    classifier: Arc<dyn Classifier>,
    events: EventBus,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Start a session, optionally pre-selecting the exercise used when
    /// calibration produces no votes
    pub fn create_session(&self, default_exercise: Option<&str>) -> AnalysisSession {
        self.create_session_at(default_exercise, Instant::now())
    }

    pub fn create_session_at(
        &self,
        default_exercise: Option<&str>,
        now: Instant,
    ) -> AnalysisSession {
        if let Some(name) = default_exercise {
            if ExerciseKind::from_name(name).is_none() {
                warn!("Default exercise '{}' has no rule set", name);
            }
        }

        let session = AnalysisSession::new(
            default_exercise.map(str::to_string),
            self.config.session.buffer_capacity,
            now,
        );
        info!("Created session {}", session.id());

        self.events.notify(EngineEvent::SessionCreated {
            session_id: session.id(),
            default_exercise: session.default_exercise().map(str::to_string),
            timestamp: Utc::now(),
        });

        session
    }

    /// Analyze one observation from a live session
    pub fn analyze_frame(
        &self,
        session: &mut AnalysisSession,
        observation: PoseObservation,
    ) -> Result<FrameResult> {
        self.analyze_frame_at(session, observation, Instant::now())
    }

    /// Analyze one observation as if it arrived at `now`
    pub fn analyze_frame_at(
        &self,
        session: &mut AnalysisSession,
        observation: PoseObservation,
        now: Instant,
    ) -> Result<FrameResult> {
        let orchestrator =
            SessionOrchestrator::new(self.classifier.as_ref(), &self.config.session, &self.events);

        orchestrator
            .process(session, observation, now)
            .map_err(|e| self.classifier_failure(e))
    }

    /// Analyze a complete recorded sequence of `(frame, is_visible)` pairs
    pub fn analyze_video<I>(&self, sequence: I) -> Result<VideoAnalysis>
    where
        I: IntoIterator<Item = (Frame, bool)>,
    {
        let (frames, visibility): (Vec<Frame>, Vec<bool>) = sequence.into_iter().unzip();
        debug!("Analyzing recorded sequence of {} frames", frames.len());

        let pipeline = VideoAnalysisPipeline::new(
            self.classifier.as_ref(),
            &self.config.windows,
            self.config.classifier.vote_confidence,
        );

        let analysis = pipeline.run(&frames, &visibility).map_err(|e| match e {
            FormcheckError::Classifier(e) => self.classifier_failure(e),
            other => other,
        })?;

        self.events.notify(EngineEvent::VideoAnalyzed {
            exercise: analysis.exercise.clone(),
            voting_confidence: analysis.voting_confidence,
            is_correct: analysis.is_correct,
            timestamp: Utc::now(),
        });

        Ok(analysis)
    }

    /// Return a session to setup, discarding its buffer, votes and lock
    pub fn reset(&self, session: &mut AnalysisSession) {
        self.reset_at(session, Instant::now());
    }

    pub fn reset_at(&self, session: &mut AnalysisSession, now: Instant) {
        session.reset(now);
        info!("Reset session {}", session.id());
        self.events.notify(EngineEvent::SessionReset {
            session_id: session.id(),
            timestamp: Utc::now(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_filtered<S: Into<String>>(
        &self,
        filter: EventFilter,
        name: S,
    ) -> EventReceiver {
        self.events.subscribe_filtered(filter, name)
    }

    pub fn config(&self) -> &FormcheckConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    fn classifier_failure(&self, e: ClassifierError) -> FormcheckError {
        error!("{} failed: {}", self.classifier.name(), e);
        self.events.notify(EngineEvent::SystemError {
            component: self.classifier.name().to_string(),
            error: e.to_string(),
            timestamp: Utc::now(),
        });
        e.into()
    }
}
