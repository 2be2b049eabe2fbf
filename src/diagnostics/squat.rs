use super::rules::{evaluate, select_frame, Rule};
use super::verdict::{DiagnosticVerdict, IssueDetail};
use crate::landmark::{Frame, Joint, Side};
use tracing::debug;

/// Knees closer together than this fraction of ankle width count as collapse
pub const KNEE_VALGUS_RATIO: f64 = 0.9;
/// How far (normalized height) a heel may sit above its foot tip
pub const HEEL_RISE_MARGIN: f64 = 0.03;
/// Allowed lateral offset between shoulder and hip midlines
pub const LATERAL_SHIFT_TOLERANCE: f64 = 0.05;

const SIDES: [Side; 2] = [Side::Left, Side::Right];

/// Measurements taken at the deepest frame of the buffer
#[derive(Debug, Clone)]
pub(crate) struct SquatMeasurements {
    pub hip_y: f64,
    pub knee_y: f64,
    pub knee_width: f64,
    pub ankle_width: f64,
    pub collapsed_knees: Vec<Side>,
    pub raised_heels: Vec<Side>,
    pub lateral_shift: f64,
    pub shift_toward: Side,
}

const RULES: &[Rule<SquatMeasurements>] = &[
    Rule {
        name: "Squat too shallow",
        check: too_shallow,
    },
    Rule {
        name: "Knee Valgus (Collapse)",
        check: knee_valgus,
    },
    Rule {
        name: "Heels rising",
        check: heels_rising,
    },
    Rule {
        name: "Asymmetrical Shift",
        check: asymmetrical_shift,
    },
];

fn too_shallow(m: &SquatMeasurements) -> Option<IssueDetail> {
    // Hips must sink below knee level; NaN depth counts as shallow
    (!(m.hip_y > m.knee_y)).then_some(IssueDetail::Flag(true))
}

fn knee_valgus(m: &SquatMeasurements) -> Option<IssueDetail> {
    if m.knee_width < KNEE_VALGUS_RATIO * m.ankle_width {
        match m.collapsed_knees.as_slice() {
            [side] => Some(IssueDetail::side(*side)),
            _ => IssueDetail::for_sides(&SIDES),
        }
    } else {
        None
    }
}

fn heels_rising(m: &SquatMeasurements) -> Option<IssueDetail> {
    IssueDetail::for_sides(&m.raised_heels)
}

fn asymmetrical_shift(m: &SquatMeasurements) -> Option<IssueDetail> {
    (m.lateral_shift.abs() > LATERAL_SHIFT_TOLERANCE).then(|| IssueDetail::side(m.shift_toward))
}

/// Index of the frame with the lowest hips (largest y)
pub(crate) fn deepest_frame(frames: &[Frame]) -> usize {
    select_frame(frames, |frame| frame.mid_y(Joint::Hip))
}

pub(crate) fn measure(frame: &Frame) -> SquatMeasurements {
    let ankle_mid_x = frame.mid_x(Joint::Ankle);

    let collapsed_knees = SIDES
        .into_iter()
        .filter(|&side| {
            let knee_offset = (frame.joint(Joint::Knee, side).x - ankle_mid_x).abs();
            let ankle_offset = (frame.joint(Joint::Ankle, side).x - ankle_mid_x).abs();
            knee_offset < KNEE_VALGUS_RATIO * ankle_offset
        })
        .collect();

    let raised_heels = SIDES
        .into_iter()
        .filter(|&side| {
            frame.joint(Joint::Heel, side).y
                < frame.joint(Joint::FootIndex, side).y - HEEL_RISE_MARGIN
        })
        .collect();

    let lateral_shift = frame.mid_x(Joint::Shoulder) - frame.mid_x(Joint::Hip);
    let left_direction =
        frame.joint(Joint::Hip, Side::Left).x - frame.joint(Joint::Hip, Side::Right).x;
    let shift_toward = if lateral_shift * left_direction > 0.0 {
        Side::Left
    } else {
        Side::Right
    };

    SquatMeasurements {
        hip_y: frame.mid_y(Joint::Hip),
        knee_y: frame.mid_y(Joint::Knee),
        knee_width: (frame.joint(Joint::Knee, Side::Left).x
            - frame.joint(Joint::Knee, Side::Right).x)
            .abs(),
        ankle_width: (frame.joint(Joint::Ankle, Side::Left).x
            - frame.joint(Joint::Ankle, Side::Right).x)
            .abs(),
        collapsed_knees,
        raised_heels,
        lateral_shift,
        shift_toward,
    }
}

/// Judge a squat at its deepest point
pub(crate) fn diagnose(frames: &[Frame]) -> DiagnosticVerdict {
    let index = deepest_frame(frames);
    let measurements = measure(&frames[index]);

    debug!(
        "Squat analysis frame {}/{}: hip_y={:.3} knee_y={:.3} knee_width={:.3} ankle_width={:.3}",
        index,
        frames.len(),
        measurements.hip_y,
        measurements.knee_y,
        measurements.knee_width,
        measurements.ankle_width
    );

    DiagnosticVerdict::from_issues(evaluate(RULES, &measurements))
}
