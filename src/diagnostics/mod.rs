//! Rule-based biomechanical diagnostician.
//!
//! Each exercise owns a rule table evaluated in a fixed order. Every violated
//! rule is reported, so a single verdict can carry several corrections.

pub(crate) mod abduction;
mod exercise;
pub(crate) mod hurdle;
mod rules;
mod squat;
mod variant;
mod verdict;

#[cfg(test)]
pub(crate) mod fixtures;


pub use abduction::{MAX_ABDUCTION_ANGLE, MIN_ABDUCTION_ANGLE};
pub use exercise::{display_name, ExerciseKind};
pub use variant::{detect_variant, ExerciseVariant};
pub use verdict::{
    DiagnosticVerdict, Feedback, Issue, IssueDetail, MOVEMENT_CORRECT, NO_DATA_PROVIDED,
    NO_MOVEMENT_DETECTED, NO_SPECIFIC_ANALYSIS,
};

use crate::landmark::Frame;
use tracing::debug;

/// Diagnose a landmark buffer for one exercise.
///
/// An empty buffer is `(false, "No data provided")`; an exercise without a rule
/// set is `(true, "No specific analysis available")`. When `forced_variant` is
/// `None` the active side is detected from the buffer.
pub fn diagnose(
    exercise_name: &str,
    frames: &[Frame],
    forced_variant: Option<ExerciseVariant>,
) -> DiagnosticVerdict {
    if frames.is_empty() {
        return DiagnosticVerdict::message(false, NO_DATA_PROVIDED);
    }

    let Some(kind) = ExerciseKind::from_name(exercise_name) else {
        debug!("No rule set for exercise '{}'", exercise_name);
        return DiagnosticVerdict::message(true, NO_SPECIFIC_ANALYSIS);
    };

    let variant = forced_variant.unwrap_or_else(|| detect_variant(exercise_name, frames));

    let verdict = match kind {
        ExerciseKind::DeepSquat => squat::diagnose(frames),
        ExerciseKind::StandingShoulderAbduction => abduction::diagnose(frames, variant),
        ExerciseKind::HurdleStep => hurdle::diagnose(frames, variant),
    };

    debug!(
        "Diagnosed {} over {} frames ({:?}): correct={} feedback={}",
        kind,
        frames.len(),
        variant,
        verdict.is_correct,
        verdict.feedback.summary()
    );

    verdict
}
