//! Synthetic poses for tests. The subject faces the camera, so the person's
//! left side has the larger x.

use crate::landmark::{joints, Frame, Joint, Landmark, Side, JOINT_COUNT};

const SHOULDER_Y: f64 = 0.35;
const HIP_Y: f64 = 0.65;
const KNEE_Y: f64 = 0.80;
const ANKLE_Y: f64 = 0.95;
const FOOT_Y: f64 = 0.96;
const UPPER_ARM: f64 = 0.15;
const FOREARM: f64 = 0.15;

fn side_x(side: Side) -> f64 {
    match side {
        Side::Left => 0.6,
        Side::Right => 0.4,
    }
}

pub(crate) struct PoseBuilder {
    landmarks: Vec<Landmark>,
}

impl PoseBuilder {
    /// Upright stance, arms hanging, feet flat and hip-width apart
    pub(crate) fn standing() -> Self {
        let mut builder = Self {
            landmarks: vec![Landmark::new(0.5, 0.2, 0.0); JOINT_COUNT],
        };

        for side in [Side::Left, Side::Right] {
            let x = side_x(side);
            builder = builder
                .joint(Joint::Shoulder, side, x, SHOULDER_Y)
                .joint(Joint::Elbow, side, x, SHOULDER_Y + UPPER_ARM)
                .joint(Joint::Wrist, side, x, SHOULDER_Y + UPPER_ARM + FOREARM)
                .joint(Joint::Hip, side, x, HIP_Y)
                .joint(Joint::Knee, side, x, KNEE_Y)
                .joint(Joint::Ankle, side, x, ANKLE_Y)
                .joint(Joint::Heel, side, x, FOOT_Y)
                .joint(Joint::FootIndex, side, x, FOOT_Y);
        }

        builder
    }

    pub(crate) fn joint(mut self, joint: Joint, side: Side, x: f64, y: f64) -> Self {
        self.landmarks[joint.index(side)] = Landmark::new(x, y, 0.0);
        self
    }

    pub(crate) fn nose(mut self, x: f64, y: f64) -> Self {
        self.landmarks[joints::NOSE] = Landmark::new(x, y, 0.0);
        self
    }

    /// Move one joint by `dy` vertically
    pub(crate) fn shift_y(mut self, joint: Joint, side: Side, dy: f64) -> Self {
        self.landmarks[joint.index(side)].y += dy;
        self
    }

    /// Raise an arm to `degrees` of abduction, straight elbow
    pub(crate) fn arm(self, side: Side, degrees: f64) -> Self {
        let outward = match side {
            Side::Left => 1.0,
            Side::Right => -1.0,
        };
        let radians = degrees.to_radians();
        let (dx, dy) = (outward * radians.sin(), radians.cos());
        let shoulder_x = side_x(side);

        self.joint(
            Joint::Elbow,
            side,
            shoulder_x + UPPER_ARM * dx,
            SHOULDER_Y + UPPER_ARM * dy,
        )
        .joint(
            Joint::Wrist,
            side,
            shoulder_x + (UPPER_ARM + FOREARM) * dx,
            SHOULDER_Y + (UPPER_ARM + FOREARM) * dy,
        )
    }

    pub(crate) fn build(self) -> Frame {
        Frame::new(self.landmarks).expect("fixture has full joint count")
    }
}

/// Squat pose with explicit hip and knee heights
pub(crate) fn squat_frame(hip_y: f64, knee_y: f64) -> Frame {
    let mut builder = PoseBuilder::standing().nose(0.5, hip_y - 0.45);
    for side in [Side::Left, Side::Right] {
        let x = side_x(side);
        builder = builder
            .joint(Joint::Shoulder, side, x, hip_y - 0.3)
            .joint(Joint::Elbow, side, x, hip_y - 0.15)
            .joint(Joint::Wrist, side, x, hip_y)
            .joint(Joint::Hip, side, x, hip_y)
            .joint(Joint::Knee, side, x, knee_y);
    }
    builder.build()
}

/// Squat pose with knees drawn inward to `ratio` of ankle width
pub(crate) fn valgus_squat_frame(ratio: f64) -> Frame {
    let half_width = 0.1 * ratio;
    PoseBuilder::standing()
        .joint(Joint::Hip, Side::Left, 0.6, 0.7)
        .joint(Joint::Hip, Side::Right, 0.4, 0.7)
        .joint(Joint::Shoulder, Side::Left, 0.6, 0.4)
        .joint(Joint::Shoulder, Side::Right, 0.4, 0.4)
        .joint(Joint::Knee, Side::Left, 0.5 + half_width, 0.6)
        .joint(Joint::Knee, Side::Right, 0.5 - half_width, 0.6)
        .build()
}

/// Both arms abducted to the same angle
pub(crate) fn abduction_frame(degrees: f64) -> Frame {
    PoseBuilder::standing()
        .arm(Side::Left, degrees)
        .arm(Side::Right, degrees)
        .build()
}

/// Hurdle step with the knee on `moving` lifted to `knee_y`
pub(crate) fn hurdle_frame(moving: Side, knee_y: f64) -> Frame {
    PoseBuilder::standing()
        .joint(Joint::Knee, moving, side_x(moving), knee_y)
        .joint(Joint::Ankle, moving, side_x(moving), knee_y + 0.15)
        .build()
}

/// Sequence that repeats one frame
pub(crate) fn repeat(frame: Frame, count: usize) -> Vec<Frame> {
    vec![frame; count]
}

/// Squat cycle oscillating between standing and the given depth
pub(crate) fn squat_cycle(count: usize, bottom_hip_y: f64) -> Vec<Frame> {
    (0..count)
        .map(|i| {
            let phase = (i as f64 / 10.0 * std::f64::consts::PI).sin().abs();
            let hip_y = 0.65 + (bottom_hip_y - 0.65) * phase;
            squat_frame(hip_y, 0.8 - 0.1 * phase)
        })
        .collect()
}
