use crate::landmark::{Frame, Joint, Side};

/// Joints whose vertical travel indicates exercise movement
const TRACKED_JOINTS: [(Joint, Side); 6] = [
    (Joint::Hip, Side::Left),
    (Joint::Hip, Side::Right),
    (Joint::Knee, Side::Left),
    (Joint::Knee, Side::Right),
    (Joint::Wrist, Side::Left),
    (Joint::Wrist, Side::Right),
];

/// Population variance of one joint's y over the frames
pub fn vertical_variance(frames: &[Frame], joint: Joint, side: Side) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }
    let count = frames.len() as f64;
    let mean = frames.iter().map(|f| f.joint(joint, side).y).sum::<f64>() / count;
    frames
        .iter()
        .map(|f| {
            let d = f.joint(joint, side).y - mean;
            d * d
        })
        .sum::<f64>()
        / count
}

/// Largest vertical variance among the tracked joints; non-finite values are ignored
pub fn motion_energy(frames: &[Frame]) -> f64 {
    TRACKED_JOINTS
        .iter()
        .map(|&(joint, side)| vertical_variance(frames, joint, side))
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max)
}

/// Whether the frames show deliberate movement.
///
/// Fewer than `min_samples` frames never count as movement, however much
/// they vary.
pub fn has_significant_motion(frames: &[Frame], threshold: f64, min_samples: usize) -> bool {
    if frames.is_empty() || frames.len() < min_samples {
        return false;
    }
    motion_energy(frames) > threshold
}
