use super::rules::{evaluate, peak, select_frame, Rule};
use super::variant::ExerciseVariant;
use super::verdict::{DiagnosticVerdict, IssueDetail};
use crate::geometry::distance;
use crate::landmark::{Frame, Joint, Side};
use tracing::debug;

/// Required knee clearance over the stance knee, as a fraction of stance thigh length
pub const MIN_STEP_CLEARANCE_RATIO: f64 = 0.5;
/// Allowed drop of the moving-side hip below the stance-side hip
pub const PELVIC_DROP_TOLERANCE: f64 = 0.03;
/// Stance knee closer to the midline than this fraction of the ankle offset counts as valgus
pub const STANCE_VALGUS_RATIO: f64 = 0.9;
/// A knee within this distance below its hip marks the side as active
pub const ACTIVE_KNEE_GAP: f64 = 0.10;

const MIN_SEGMENT_LENGTH: f64 = 1e-6;

#[derive(Debug, Clone)]
pub(crate) struct HurdleMeasurements {
    pub moving: Side,
    pub clearance: f64,
    pub stance_thigh: f64,
    pub hip_drop: f64,
    pub stance_knee_offset: f64,
    pub stance_ankle_offset: f64,
}

const RULES: &[Rule<HurdleMeasurements>] = &[
    Rule {
        name: "Step too low",
        check: step_too_low,
    },
    Rule {
        name: "Pelvic Drop (Instability)",
        check: pelvic_drop,
    },
    Rule {
        name: "Stance Knee Valgus",
        check: stance_knee_valgus,
    },
];

fn step_too_low(m: &HurdleMeasurements) -> Option<IssueDetail> {
    let clears = m.stance_thigh > MIN_SEGMENT_LENGTH
        && m.clearance >= MIN_STEP_CLEARANCE_RATIO * m.stance_thigh;
    (!clears).then(|| IssueDetail::side(m.moving))
}

fn pelvic_drop(m: &HurdleMeasurements) -> Option<IssueDetail> {
    (m.hip_drop > PELVIC_DROP_TOLERANCE).then(|| IssueDetail::side(m.moving))
}

fn stance_knee_valgus(m: &HurdleMeasurements) -> Option<IssueDetail> {
    (m.stance_knee_offset < STANCE_VALGUS_RATIO * m.stance_ankle_offset)
        .then(|| IssueDetail::side(m.moving.opposite()))
}

/// Height of the knee on `side` above the opposite knee
pub(crate) fn knee_lift(frame: &Frame, side: Side) -> f64 {
    frame.joint(Joint::Knee, side.opposite()).y - frame.joint(Joint::Knee, side).y
}

/// Whether the knee on `side` is raised toward hip level
pub(crate) fn is_side_active(frame: &Frame, side: Side) -> bool {
    frame.joint(Joint::Knee, side).y - frame.joint(Joint::Hip, side).y < ACTIVE_KNEE_GAP
}

/// Resolve the stepping leg; an ambiguous variant picks the leg with the higher peak lift
pub(crate) fn moving_side(frames: &[Frame], variant: ExerciseVariant) -> Side {
    match variant {
        ExerciseVariant::Left => Side::Left,
        ExerciseVariant::Right => Side::Right,
        ExerciseVariant::Both => {
            let left = peak(frames.iter().map(|f| knee_lift(f, Side::Left)), 0.0);
            let right = peak(frames.iter().map(|f| knee_lift(f, Side::Right)), 0.0);
            if right > left {
                Side::Right
            } else {
                Side::Left
            }
        }
    }
}

pub(crate) fn measure(frame: &Frame, moving: Side) -> HurdleMeasurements {
    let stance = moving.opposite();
    let stance_hip = frame.joint(Joint::Hip, stance);
    let stance_knee = frame.joint(Joint::Knee, stance);
    let midline_x = frame.mid_x(Joint::Hip);

    HurdleMeasurements {
        moving,
        clearance: stance_knee.y - frame.joint(Joint::Knee, moving).y,
        stance_thigh: distance(stance_hip, stance_knee),
        hip_drop: frame.joint(Joint::Hip, moving).y - stance_hip.y,
        stance_knee_offset: (stance_knee.x - midline_x).abs(),
        stance_ankle_offset: (frame.joint(Joint::Ankle, stance).x - midline_x).abs(),
    }
}

/// Judge a hurdle step at the peak of the moving knee's lift
pub(crate) fn diagnose(frames: &[Frame], variant: ExerciseVariant) -> DiagnosticVerdict {
    let moving = moving_side(frames, variant);
    let index = select_frame(frames, |frame| knee_lift(frame, moving));
    let measurements = measure(&frames[index], moving);

    debug!(
        "Hurdle step analysis frame {}/{} (moving {:?}): \
         clearance={:.3} thigh={:.3} hip_drop={:.3}",
        index,
        frames.len(),
        moving,
        measurements.clearance,
        measurements.stance_thigh,
        measurements.hip_drop
    );

    DiagnosticVerdict::from_issues(evaluate(RULES, &measurements))
}
