use crate::error::EventBusError;
use crate::session::SessionPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Events emitted by the analysis engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A new analysis session was opened
    SessionCreated {
        session_id: Uuid,
        default_exercise: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// A session moved to another phase
    PhaseChanged {
        session_id: Uuid,
        from: SessionPhase,
        to: SessionPhase,
        timestamp: DateTime<Utc>,
    },
    /// A calibration window produced a vote
    CalibrationVote {
        session_id: Uuid,
        label: String,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },
    /// The session's exercise was fixed for training
    ExerciseLocked {
        session_id: Uuid,
        exercise: String,
        from_votes: bool,
        timestamp: DateTime<Utc>,
    },
    /// Calibration ended without votes or a default and starts over
    CalibrationRestarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// A training window was diagnosed
    DiagnosisCompleted {
        session_id: Uuid,
        exercise: String,
        is_correct: bool,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },
    /// A session was returned to setup
    SessionReset {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// An offline recording was analyzed
    VideoAnalyzed {
        exercise: String,
        voting_confidence: f64,
        is_correct: bool,
        timestamp: DateTime<Utc>,
    },
    /// A component failed
    SystemError {
        component: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            EngineEvent::SessionCreated { timestamp, .. }
            | EngineEvent::PhaseChanged { timestamp, .. }
            | EngineEvent::CalibrationVote { timestamp, .. }
            | EngineEvent::ExerciseLocked { timestamp, .. }
            | EngineEvent::CalibrationRestarted { timestamp, .. }
            | EngineEvent::DiagnosisCompleted { timestamp, .. }
            | EngineEvent::SessionReset { timestamp, .. }
            | EngineEvent::VideoAnalyzed { timestamp, .. }
            | EngineEvent::SystemError { timestamp, .. } => *timestamp,
        }
    }

    /// Session the event belongs to, if any
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            EngineEvent::SessionCreated { session_id, .. }
            | EngineEvent::PhaseChanged { session_id, .. }
            | EngineEvent::CalibrationVote { session_id, .. }
            | EngineEvent::ExerciseLocked { session_id, .. }
            | EngineEvent::CalibrationRestarted { session_id, .. }
            | EngineEvent::DiagnosisCompleted { session_id, .. }
            | EngineEvent::SessionReset { session_id, .. } => Some(*session_id),
            EngineEvent::VideoAnalyzed { .. } | EngineEvent::SystemError { .. } => None,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            EngineEvent::SessionCreated {
                session_id,
                default_exercise,
                ..
            } => match default_exercise {
                Some(exercise) => format!("Session {} created (default {})", session_id, exercise),
                None => format!("Session {} created", session_id),
            },
            EngineEvent::PhaseChanged {
                session_id,
                from,
                to,
                ..
            } => format!("Session {} phase {:?} -> {:?}", session_id, from, to),
            EngineEvent::CalibrationVote {
                session_id,
                label,
                confidence,
                ..
            } => format!(
                "Session {} calibration vote {} ({:.2})",
                session_id, label, confidence
            ),
            EngineEvent::ExerciseLocked {
                session_id,
                exercise,
                from_votes,
                ..
            } => format!(
                "Session {} locked to {} ({})",
                session_id,
                exercise,
                if *from_votes { "voted" } else { "default" }
            ),
            EngineEvent::CalibrationRestarted { session_id, .. } => {
                format!("Session {} restarted calibration", session_id)
            }
            EngineEvent::DiagnosisCompleted {
                session_id,
                exercise,
                is_correct,
                confidence,
                ..
            } => format!(
                "Session {} diagnosed {}: {} ({:.2})",
                session_id,
                exercise,
                if *is_correct { "correct" } else { "incorrect" },
                confidence
            ),
            EngineEvent::SessionReset { session_id, .. } => {
                format!("Session {} reset", session_id)
            }
            EngineEvent::VideoAnalyzed {
                exercise,
                voting_confidence,
                is_correct,
                ..
            } => format!(
                "Video analyzed as {} ({:.2}): {}",
                exercise,
                voting_confidence,
                if *is_correct { "correct" } else { "incorrect" }
            ),
            EngineEvent::SystemError { component, error, .. } => {
                format!("Error in {}: {}", component, error)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::SessionCreated { .. } => "session_created",
            EngineEvent::PhaseChanged { .. } => "phase_changed",
            EngineEvent::CalibrationVote { .. } => "calibration_vote",
            EngineEvent::ExerciseLocked { .. } => "exercise_locked",
            EngineEvent::CalibrationRestarted { .. } => "calibration_restarted",
            EngineEvent::DiagnosisCompleted { .. } => "diagnosis_completed",
            EngineEvent::SessionReset { .. } => "session_reset",
            EngineEvent::VideoAnalyzed { .. } => "video_analyzed",
            EngineEvent::SystemError { .. } => "system_error",
        }
    }
}

/// Event bus for observing engine activity using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        Self {
            debug_logging: true,
            ..Self::new(capacity)
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter
    pub fn subscribe_filtered<S: Into<String>>(
        &self,
        filter: EventFilter,
        name: S,
    ) -> EventReceiver {
        EventReceiver::new(self.subscribe(), filter, name.into())
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: EngineEvent) -> Result<usize, EventBusError> {
        if self.debug_logging {
            debug!("Publishing event: {}", event.description());
        }

        match &event {
            EngineEvent::ExerciseLocked { .. } | EngineEvent::VideoAnalyzed { .. } => {
                info!("{}", event.description());
            }
            EngineEvent::CalibrationRestarted { .. } => {
                warn!("{}", event.description());
            }
            EngineEvent::SystemError { component, error, .. } => {
                error!("System error in {}: {}", component, error);
            }
            _ => {}
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish without failing when nobody is listening
    pub fn notify(&self, event: EngineEvent) {
        if let Err(e) = self.publish(event) {
            trace!("Event not delivered: {}", e);
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Accept events of specific sessions
    Sessions(Vec<Uuid>),
    /// Custom filter function
    Custom(fn(&EngineEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &EngineEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Sessions(sessions) => event
                .session_id()
                .map_or(false, |id| sessions.contains(&id)),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<EngineEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(
        receiver: broadcast::Receiver<EngineEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<EngineEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<EngineEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    fn reset_event(session_id: Uuid) -> EngineEvent {
        EngineEvent::SessionReset {
            session_id,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_basic_operations() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let event = EngineEvent::CalibrationVote {
            session_id: Uuid::new_v4(),
            label: "deep_squat".to_string(),
            confidence: 0.9,
            timestamp: Utc::now(),
        };

        let subscriber_count = event_bus.publish(event).unwrap();
        assert_eq!(subscriber_count, 1);

        match receiver.recv().await.unwrap() {
            EngineEvent::CalibrationVote { label, confidence, .. } => {
                assert_eq!(label, "deep_squat");
                assert_eq!(confidence, 0.9);
            }
            other => panic!("Unexpected event type: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish(reset_event(Uuid::new_v4())).unwrap();

        let _ = timeout(Duration::from_millis(100), receiver1.recv())
            .await
            .unwrap()
            .unwrap();
        let _ = timeout(Duration::from_millis(100), receiver2.recv())
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_publish_without_subscribers() {
        let event_bus = EventBus::new(10);
        assert!(!event_bus.has_subscribers());
        assert!(event_bus.publish(reset_event(Uuid::new_v4())).is_err());
        // notify swallows the delivery failure
        event_bus.notify(reset_event(Uuid::new_v4()));
    }

    #[test]
    fn test_event_filter() {
        let session = Uuid::new_v4();
        let reset = reset_event(session);
        let video = EngineEvent::VideoAnalyzed {
            exercise: "deep_squat".to_string(),
            voting_confidence: 1.0,
            is_correct: true,
            timestamp: Utc::now(),
        };

        let by_type = EventFilter::EventTypes(vec!["video_analyzed"]);
        assert!(by_type.matches(&video));
        assert!(!by_type.matches(&reset));

        let by_session = EventFilter::Sessions(vec![session]);
        assert!(by_session.matches(&reset));
        assert!(!by_session.matches(&video));
        assert!(!by_session.matches(&reset_event(Uuid::new_v4())));
    }

    #[tokio::test]
    async fn test_filtered_receiver() {
        let event_bus = EventBus::new(10);
        let session = Uuid::new_v4();
        let mut receiver =
            event_bus.subscribe_filtered(EventFilter::Sessions(vec![session]), "test");

        event_bus.publish(reset_event(Uuid::new_v4())).unwrap();
        event_bus.publish(reset_event(session)).unwrap();

        let event = timeout(Duration::from_millis(100), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.session_id(), Some(session));
        assert!(receiver.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_event_serializes() {
        let event = EngineEvent::PhaseChanged {
            session_id: Uuid::new_v4(),
            from: SessionPhase::Setup,
            to: SessionPhase::Calibrating,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("PhaseChanged"));
        assert!(json.contains("calibrating"));
        assert_eq!(event.event_type(), "phase_changed");
    }
}
