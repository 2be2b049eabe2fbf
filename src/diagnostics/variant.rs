use super::exercise::ExerciseKind;
use super::{abduction, hurdle};
use crate::landmark::{Frame, Side};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Which body side is performing an asymmetric exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExerciseVariant {
    Left,
    Right,
    Both,
}

impl ExerciseVariant {
    /// Sides the rules should examine
    pub fn sides(self) -> &'static [Side] {
        match self {
            ExerciseVariant::Left => &[Side::Left],
            ExerciseVariant::Right => &[Side::Right],
            ExerciseVariant::Both => &[Side::Left, Side::Right],
        }
    }
}

/// Detect the active side of an exercise over a frame window.
///
/// Empty input, unknown exercises and symmetric exercises yield `Both`. For
/// two-sided exercises a side is active when its signal crosses the activity
/// threshold in any frame; exactly one active side selects that side, anything
/// else is ambiguous and yields `Both`.
pub fn detect_variant(exercise_name: &str, frames: &[Frame]) -> ExerciseVariant {
    if frames.is_empty() {
        return ExerciseVariant::Both;
    }

    let active: fn(&Frame, Side) -> bool = match ExerciseKind::from_name(exercise_name) {
        Some(ExerciseKind::StandingShoulderAbduction) => abduction::is_side_active,
        Some(ExerciseKind::HurdleStep) => hurdle::is_side_active,
        Some(ExerciseKind::DeepSquat) | None => return ExerciseVariant::Both,
    };

    let left = frames.iter().any(|frame| active(frame, Side::Left));
    let right = frames.iter().any(|frame| active(frame, Side::Right));
    trace!(
        "Variant signals for '{}': left={} right={}",
        exercise_name,
        left,
        right
    );

    match (left, right) {
        (true, false) => ExerciseVariant::Left,
        (false, true) => ExerciseVariant::Right,
        _ => ExerciseVariant::Both,
    }
}
