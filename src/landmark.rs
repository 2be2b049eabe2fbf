use crate::error::FrameError;
use serde::{Deserialize, Serialize};

/// Number of joints in every pose frame
pub const JOINT_COUNT: usize = 33;

/// Joint indices of the 33-point body model
pub mod joints {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
    pub const LEFT_HEEL: usize = 29;
    pub const RIGHT_HEEL: usize = 30;
    pub const LEFT_FOOT_INDEX: usize = 31;
    pub const RIGHT_FOOT_INDEX: usize = 32;
}

/// Body side, used to address paired joints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Single-letter tag used in feedback annotations
    pub fn tag(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

/// Paired joints that exist on both sides of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
    Heel,
    FootIndex,
}

impl Joint {
    /// Landmark index of this joint on the given side
    pub fn index(self, side: Side) -> usize {
        use joints::*;
        match (self, side) {
            (Joint::Shoulder, Side::Left) => LEFT_SHOULDER,
            (Joint::Shoulder, Side::Right) => RIGHT_SHOULDER,
            (Joint::Elbow, Side::Left) => LEFT_ELBOW,
            (Joint::Elbow, Side::Right) => RIGHT_ELBOW,
            (Joint::Wrist, Side::Left) => LEFT_WRIST,
            (Joint::Wrist, Side::Right) => RIGHT_WRIST,
            (Joint::Hip, Side::Left) => LEFT_HIP,
            (Joint::Hip, Side::Right) => RIGHT_HIP,
            (Joint::Knee, Side::Left) => LEFT_KNEE,
            (Joint::Knee, Side::Right) => RIGHT_KNEE,
            (Joint::Ankle, Side::Left) => LEFT_ANKLE,
            (Joint::Ankle, Side::Right) => RIGHT_ANKLE,
            (Joint::Heel, Side::Left) => LEFT_HEEL,
            (Joint::Heel, Side::Right) => RIGHT_HEEL,
            (Joint::FootIndex, Side::Left) => LEFT_FOOT_INDEX,
            (Joint::FootIndex, Side::Right) => RIGHT_FOOT_INDEX,
        }
    }
}

/// A single tracked joint in normalized image coordinates (larger y is lower)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One time instant of the body model: exactly [`JOINT_COUNT`] landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct Frame {
    landmarks: Vec<Landmark>,
}

impl Frame {
    /// Create a frame, rejecting any joint count other than [`JOINT_COUNT`]
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, FrameError> {
        if landmarks.len() != JOINT_COUNT {
            return Err(FrameError::JointCount {
                expected: JOINT_COUNT,
                actual: landmarks.len(),
            });
        }
        Ok(Self { landmarks })
    }

    /// Build a frame from raw coordinate rows (`[x, y, z]` or `[x, y, z, visibility]`)
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, FrameError> {
        if rows.len() != JOINT_COUNT {
            return Err(FrameError::JointCount {
                expected: JOINT_COUNT,
                actual: rows.len(),
            });
        }

        let mut landmarks = Vec::with_capacity(JOINT_COUNT);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let landmark = match *row {
                [x, y, z] => Landmark::new(x, y, z),
                [x, y, z, visibility] => Landmark::new(x, y, z).with_visibility(visibility),
                _ => {
                    return Err(FrameError::CoordinateArity {
                        index,
                        arity: row.len(),
                    })
                }
            };
            landmarks.push(landmark);
        }

        Ok(Self { landmarks })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Landmark by raw index; callers pass indices below `JOINT_COUNT`
    pub(crate) fn at(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    /// Landmark of a paired joint on one side
    pub fn joint(&self, joint: Joint, side: Side) -> &Landmark {
        self.at(joint.index(side))
    }

    pub fn nose(&self) -> &Landmark {
        self.at(joints::NOSE)
    }

    /// Mean y of a left/right joint pair
    pub fn mid_y(&self, joint: Joint) -> f64 {
        (self.joint(joint, Side::Left).y + self.joint(joint, Side::Right).y) / 2.0
    }

    /// Mean x of a left/right joint pair
    pub fn mid_x(&self, joint: Joint) -> f64 {
        (self.joint(joint, Side::Left).x + self.joint(joint, Side::Right).x) / 2.0
    }
}

impl TryFrom<Vec<Landmark>> for Frame {
    type Error = FrameError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self, Self::Error> {
        Frame::new(landmarks)
    }
}

impl From<Frame> for Vec<Landmark> {
    fn from(frame: Frame) -> Self {
        frame.landmarks
    }
}
