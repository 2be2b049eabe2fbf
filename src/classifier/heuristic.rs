use super::{ClassificationVote, Classifier, ModelIntegrity};
use crate::diagnostics::{abduction, hurdle, ExerciseKind};
use crate::error::ClassifierError;
use crate::geometry::distance;
use crate::landmark::{Frame, Joint, Side};
use tracing::trace;

const SIDES: [Side; 2] = [Side::Left, Side::Right];
const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Geometry-only classifier used when no trained model is wired in.
///
/// Each exercise gets a score in [0, 1] from its characteristic motion: hip
/// travel for the squat, wrist elevation for shoulder abduction and one-sided
/// knee lift for the hurdle step. The best score wins; below `min_score` the
/// window is reported as no exercise.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    min_score: f64,
}

impl HeuristicClassifier {
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }

    /// Score of every known exercise for a window
    pub fn scores(&self, window: &[Frame]) -> Vec<(ExerciseKind, f64)> {
        ExerciseKind::ALL
            .iter()
            .map(|&kind| (kind, finite_or_zero(score(kind, window))))
            .collect()
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl Classifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn classify(&self, window: &[Frame]) -> Result<ClassificationVote, ClassifierError> {
        if window.is_empty() {
            return Err(ClassifierError::EmptyWindow);
        }

        let scores = self.scores(window);
        trace!("Heuristic scores: {:?}", scores);

        let best = scores
            .into_iter()
            .fold(None, |best: Option<(ExerciseKind, f64)>, (kind, score)| {
                match best {
                    Some((_, best_score)) if best_score >= score => best,
                    _ => Some((kind, score)),
                }
            });

        Ok(match best {
            Some((kind, score)) if score >= self.min_score => {
                ClassificationVote::new(kind.label(), score)
            }
            Some((_, score)) => ClassificationVote::no_exercise(1.0 - score),
            None => ClassificationVote::no_exercise(1.0),
        })
    }

    fn confidence_for(&self, window: &[Frame], exercise: &str) -> Result<f64, ClassifierError> {
        if window.is_empty() {
            return Err(ClassifierError::EmptyWindow);
        }
        Ok(ExerciseKind::from_name(exercise)
            .map(|kind| finite_or_zero(score(kind, window)))
            .unwrap_or(0.0))
    }
}

impl ModelIntegrity for HeuristicClassifier {
    fn model_name(&self) -> &str {
        "heuristic"
    }

    /// Nothing to verify: the model has no artifacts
    fn verify(&self) -> bool {
        true
    }
}

fn score(kind: ExerciseKind, window: &[Frame]) -> f64 {
    match kind {
        ExerciseKind::DeepSquat => squat_score(window),
        ExerciseKind::StandingShoulderAbduction => abduction_score(window),
        ExerciseKind::HurdleStep => hurdle_score(window),
    }
}

/// Hip travel relative to half the torso height
fn squat_score(window: &[Frame]) -> f64 {
    let hips = window.iter().map(|f| f.mid_y(Joint::Hip));
    let (low, high) = hips.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    let torso = window
        .iter()
        .map(|f| f.mid_y(Joint::Hip) - f.mid_y(Joint::Shoulder))
        .sum::<f64>()
        / window.len() as f64;

    if !(torso > MIN_SEGMENT_LENGTH) {
        return 0.0;
    }
    ((high - low) / (0.5 * torso)).clamp(0.0, 1.0)
}

/// Peak wrist elevation above resting height
fn abduction_score(window: &[Frame]) -> f64 {
    let peak = window
        .iter()
        .flat_map(|f| SIDES.map(|side| abduction::wrist_elevation(f, side)))
        .filter(|e| e.is_finite())
        .fold(0.0_f64, f64::max);
    ((peak - abduction::REST_ELEVATION) / (1.0 - abduction::REST_ELEVATION)).clamp(0.0, 1.0)
}

/// Peak one-sided knee lift relative to thigh length
fn hurdle_score(window: &[Frame]) -> f64 {
    window
        .iter()
        .flat_map(|f| {
            SIDES.map(|side| {
                let thigh = distance(
                    f.joint(Joint::Hip, side.opposite()),
                    f.joint(Joint::Knee, side.opposite()),
                );
                if thigh > MIN_SEGMENT_LENGTH {
                    hurdle::knee_lift(f, side) / thigh
                } else {
                    0.0
                }
            })
        })
        .filter(|lift| lift.is_finite())
        .fold(0.0_f64, f64::max)
        .clamp(0.0, 1.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
