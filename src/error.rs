use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormcheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

/// Rejections of malformed landmark input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("expected {expected} landmarks, got {actual}")]
    JointCount { expected: usize, actual: usize },

    #[error("landmark {index} has {arity} coordinates, expected 3 or 4")]
    CoordinateArity { index: usize, arity: usize },
}

/// Failures of the opaque classifier capability
#[derive(Error, Debug, Clone)]
pub enum ClassifierError {
    #[error("Model integrity check failed for {model}")]
    IntegrityCheckFailed { model: String },

    #[error("Inference failed: {details}")]
    Inference { details: String },

    #[error("Empty window passed to classifier")]
    EmptyWindow,
}

/// Terminal outcomes of the offline video pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("no person detected")]
    NoPersonDetected,

    #[error("no exercise detected with sufficient confidence")]
    NoConfidentExercise,

    #[error("analysis failed")]
    AnalysisFailed,
}

#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

impl FormcheckError {
    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormcheckError>;
