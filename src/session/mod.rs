//! Real-time analysis sessions.
//!
//! A session moves through `Setup -> Calibrating -> Training` as time passes.
//! Calibration collects classifier votes on moving, visible windows; training
//! diagnoses every full window against the locked exercise.

mod motion;
mod orchestrator;
mod registry;
mod result;
mod state;


pub use motion::{has_significant_motion, motion_energy, vertical_variance};
pub use orchestrator::SessionOrchestrator;
pub use registry::SessionRegistry;
pub use result::{
    FrameResult, FrameStatus, CALIBRATING_FEEDBACK, LOW_VISIBILITY_FEEDBACK, NO_MOTION_FEEDBACK,
    NO_POSE_FEEDBACK, SETUP_FEEDBACK,
};
pub use state::{AnalysisSession, SessionPhase, SessionStats};
