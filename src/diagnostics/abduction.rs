use super::rules::{evaluate, peak, trough, Rule};
use super::variant::ExerciseVariant;
use super::verdict::{DiagnosticVerdict, IssueDetail, NO_MOVEMENT_DETECTED};
use crate::geometry::projected_angle;
use crate::landmark::{Frame, Joint, Side};
use tracing::debug;

/// Lower bound of the target abduction range (degrees)
pub const MIN_ABDUCTION_ANGLE: f64 = 80.0;
/// Upper bound; above this the arm enters the impingement zone
pub const MAX_ABDUCTION_ANGLE: f64 = 100.0;
/// Shoulder-to-nose gap, relative to shoulder width, below which the shoulder is shrugged
pub const MIN_NECK_GAP_RATIO: f64 = 0.35;
/// Torso-relative wrist elevation that separates a raised arm from a resting one
pub const REST_ELEVATION: f64 = 0.25;
/// A wrist within this distance below its shoulder marks the side as active
pub const ACTIVE_WRIST_GAP: f64 = 0.10;

const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Per-side peaks across the whole buffer
#[derive(Debug, Clone)]
pub(crate) struct ArmMeasurement {
    pub side: Side,
    pub peak_angle: f64,
    pub peak_elevation: f64,
    pub min_neck_gap_ratio: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct AbductionMeasurements {
    pub arms: Vec<ArmMeasurement>,
}

impl AbductionMeasurements {
    fn sides_where<F>(&self, predicate: F) -> Vec<Side>
    where
        F: Fn(&ArmMeasurement) -> bool,
    {
        self.arms
            .iter()
            .filter(|arm| predicate(arm))
            .map(|arm| arm.side)
            .collect()
    }
}

const RULES: &[Rule<AbductionMeasurements>] = &[
    Rule {
        name: "Movement too shallow",
        check: too_shallow,
    },
    Rule {
        name: "Arm raised too high",
        check: too_high,
    },
    Rule {
        name: "Shoulder Shrug (Trapezius Elevation)",
        check: shoulder_shrug,
    },
];

fn too_shallow(m: &AbductionMeasurements) -> Option<IssueDetail> {
    IssueDetail::for_sides(&m.sides_where(|arm| arm.peak_angle < MIN_ABDUCTION_ANGLE))
}

fn too_high(m: &AbductionMeasurements) -> Option<IssueDetail> {
    IssueDetail::for_sides(&m.sides_where(|arm| arm.peak_angle > MAX_ABDUCTION_ANGLE))
}

fn shoulder_shrug(m: &AbductionMeasurements) -> Option<IssueDetail> {
    IssueDetail::for_sides(&m.sides_where(|arm| arm.min_neck_gap_ratio < MIN_NECK_GAP_RATIO))
}

/// Frontal-plane angle between the torso line and the upper arm
pub(crate) fn abduction_angle(frame: &Frame, side: Side) -> f64 {
    projected_angle(
        frame.joint(Joint::Hip, side),
        frame.joint(Joint::Shoulder, side),
        frame.joint(Joint::Elbow, side),
    )
}

/// Wrist height above the hip as a fraction of torso height (0 at hip, 1 at shoulder)
pub(crate) fn wrist_elevation(frame: &Frame, side: Side) -> f64 {
    let hip_y = frame.joint(Joint::Hip, side).y;
    let torso = hip_y - frame.joint(Joint::Shoulder, side).y;
    if !(torso > MIN_SEGMENT_LENGTH) {
        return 0.0;
    }
    (hip_y - frame.joint(Joint::Wrist, side).y) / torso
}

/// Vertical shoulder-to-nose gap relative to shoulder width
fn neck_gap_ratio(frame: &Frame, side: Side) -> f64 {
    let shoulder_width = (frame.joint(Joint::Shoulder, Side::Left).x
        - frame.joint(Joint::Shoulder, Side::Right).x)
        .abs();
    if !(shoulder_width > MIN_SEGMENT_LENGTH) {
        return f64::NAN;
    }
    (frame.joint(Joint::Shoulder, side).y - frame.nose().y) / shoulder_width
}

/// Whether the wrist on `side` is raised near or above shoulder level
pub(crate) fn is_side_active(frame: &Frame, side: Side) -> bool {
    frame.joint(Joint::Wrist, side).y < frame.joint(Joint::Shoulder, side).y + ACTIVE_WRIST_GAP
}

pub(crate) fn measure(frames: &[Frame], variant: ExerciseVariant) -> AbductionMeasurements {
    let arms = variant
        .sides()
        .iter()
        .map(|&side| ArmMeasurement {
            side,
            peak_angle: peak(frames.iter().map(|f| abduction_angle(f, side)), 0.0),
            peak_elevation: peak(frames.iter().map(|f| wrist_elevation(f, side)), 0.0),
            min_neck_gap_ratio: trough(
                frames.iter().map(|f| neck_gap_ratio(f, side)),
                f64::INFINITY,
            ),
        })
        .collect();

    AbductionMeasurements { arms }
}

/// Judge shoulder abduction over the whole buffer for the active side(s)
pub(crate) fn diagnose(frames: &[Frame], variant: ExerciseVariant) -> DiagnosticVerdict {
    let measurements = measure(frames, variant);

    for arm in &measurements.arms {
        debug!(
            "Abduction {:?}: peak_angle={:.1} peak_elevation={:.2} neck_gap_ratio={:.2}",
            arm.side, arm.peak_angle, arm.peak_elevation, arm.min_neck_gap_ratio
        );
    }

    let any_raised = measurements
        .arms
        .iter()
        .any(|arm| arm.peak_elevation > REST_ELEVATION);
    if !any_raised {
        return DiagnosticVerdict::message(false, NO_MOVEMENT_DETECTED);
    }

    DiagnosticVerdict::from_issues(evaluate(RULES, &measurements))
}
