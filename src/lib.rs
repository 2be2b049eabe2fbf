pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame_buffer;
pub mod geometry;
pub mod landmark;
pub mod pose;
pub mod report;
pub mod session;
pub mod video;
pub mod windows;

pub use classifier::{
    ClassificationVote, Classifier, HeuristicClassifier, ModelIntegrity, VoteTally, NO_EXERCISE,
    UNKNOWN,
};
pub use config::{ClassifierConfig, EventsConfig, FormcheckConfig, SessionConfig, WindowConfig};
pub use diagnostics::{
    diagnose, detect_variant, display_name, DiagnosticVerdict, ExerciseKind, ExerciseVariant,
    Feedback, Issue, IssueDetail,
};
pub use engine::{Engine, EngineBuilder};
pub use error::{
    AnalysisError, ClassifierError, EventBusError, FormcheckError, FrameError, Result,
};
pub use events::{EngineEvent, EventBus, EventFilter, EventReceiver};
pub use frame_buffer::{FrameBuffer, FrameBufferStats};
pub use landmark::{Frame, Joint, Landmark, Side, JOINT_COUNT};
pub use pose::{LandmarkFileEstimator, PoseEstimator, PoseObservation, RecordedFrame};
pub use report::{generate_report, ReportSubject};
pub use session::{
    AnalysisSession, FrameResult, FrameStatus, SessionOrchestrator, SessionPhase,
    SessionRegistry, SessionStats,
};
pub use video::{VideoAnalysis, VideoAnalysisPipeline};
pub use windows::{build_windows, SlidingWindow};
