//! Pose estimation boundary and a replay estimator for recorded landmarks.

use crate::error::{FormcheckError, FrameError, Result};
use crate::landmark::Frame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Output of pose estimation for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseObservation {
    /// Detected body, `None` when no person is in view
    pub frame: Option<Frame>,
    /// Whether the detected body is sufficiently in view
    pub is_visible: bool,
}

impl PoseObservation {
    pub fn detected(frame: Frame, is_visible: bool) -> Self {
        Self {
            frame: Some(frame),
            is_visible,
        }
    }

    pub fn no_pose() -> Self {
        Self {
            frame: None,
            is_visible: false,
        }
    }
}

/// Converts raw images or videos into landmark frames
pub trait PoseEstimator: Send + Sync {
    type Image: ?Sized;

    fn process_frame(&self, image: &Self::Image) -> Result<PoseObservation>;

    /// Lazily decode a video file; the sequence is finite and not restartable
    fn process_video_file(
        &self,
        path: &Path,
    ) -> Result<Box<dyn Iterator<Item = (Frame, bool)> + Send>>;
}

/// One recorded frame as stored in a JSON recording
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordedFrame {
    /// Landmark rows of `[x, y, z]` or `[x, y, z, visibility]`
    #[serde(default)]
    pub landmarks: Vec<Vec<f64>>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl RecordedFrame {
    pub fn to_frame(&self) -> std::result::Result<Frame, FrameError> {
        Frame::from_rows(&self.landmarks)
    }
}

/// Replays landmark recordings instead of running a vision model.
///
/// A recording is a JSON array of `{"landmarks": [[x, y, z, vis?], ...], "visible": bool}`.
/// An empty `landmarks` array means no person was detected in that frame.
#[derive(Debug, Clone, Default)]
pub struct LandmarkFileEstimator;

impl LandmarkFileEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Read every valid frame of a recording, skipping malformed ones
    pub fn load_recording(&self, path: &Path) -> Result<Vec<(Frame, bool)>> {
        Ok(self.process_video_file(path)?.collect())
    }

    /// Read a recording as live observations, keeping frames without a pose
    pub fn load_observations(&self, path: &Path) -> Result<Vec<PoseObservation>> {
        let observations = read_recording(path)?
            .iter()
            .enumerate()
            .filter_map(|(index, recorded)| match observe(recorded) {
                Ok(observation) => Some(observation),
                Err(e) => {
                    warn!("Skipping malformed recording frame {}: {}", index, e);
                    None
                }
            })
            .collect();
        Ok(observations)
    }
}

fn observe(recorded: &RecordedFrame) -> std::result::Result<PoseObservation, FrameError> {
    if recorded.landmarks.is_empty() {
        return Ok(PoseObservation::no_pose());
    }
    let frame = recorded.to_frame()?;
    Ok(PoseObservation::detected(frame, recorded.visible))
}

fn read_recording(path: &Path) -> Result<Vec<RecordedFrame>> {
    let contents = fs::read_to_string(path)?;
    let recorded: Vec<RecordedFrame> = serde_json::from_str(&contents).map_err(|e| {
        FormcheckError::component(
            "pose".to_string(),
            format!("Invalid recording {}: {}", path.display(), e),
        )
    })?;

    info!(
        "Loaded recording {} with {} frames",
        path.display(),
        recorded.len()
    );
    Ok(recorded)
}

impl PoseEstimator for LandmarkFileEstimator {
    /// One JSON-encoded [`RecordedFrame`]
    type Image = [u8];

    fn process_frame(&self, image: &[u8]) -> Result<PoseObservation> {
        let recorded: RecordedFrame = serde_json::from_slice(image)?;
        Ok(observe(&recorded)?)
    }

    fn process_video_file(
        &self,
        path: &Path,
    ) -> Result<Box<dyn Iterator<Item = (Frame, bool)> + Send>> {
        let frames = read_recording(path)?
            .into_iter()
            .enumerate()
            .filter_map(|(index, recorded)| {
                if recorded.landmarks.is_empty() {
                    debug!("Recording frame {} has no pose, skipping", index);
                    return None;
                }
                match recorded.to_frame() {
                    Ok(frame) => Some((frame, recorded.visible)),
                    Err(e) => {
                        warn!("Skipping malformed recording frame {}: {}", index, e);
                        None
                    }
                }
            });

        Ok(Box::new(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::JOINT_COUNT;
    use serde_json::json;
    use std::io::Write;

    fn rows(count: usize) -> Vec<Vec<f64>> {
        vec![vec![0.5, 0.5, 0.0, 0.9]; count]
    }

    #[test]
    fn test_process_frame() {
        let estimator = LandmarkFileEstimator::new();

        let payload = json!({"landmarks": rows(JOINT_COUNT), "visible": false}).to_string();
        let observation = estimator.process_frame(payload.as_bytes()).unwrap();
        assert!(observation.frame.is_some());
        assert!(!observation.is_visible);

        let payload = json!({"landmarks": []}).to_string();
        let observation = estimator.process_frame(payload.as_bytes()).unwrap();
        assert_eq!(observation, PoseObservation::no_pose());
    }

    #[test]
    fn test_process_frame_rejects_malformed_input() {
        let estimator = LandmarkFileEstimator::new();

        let payload = json!({"landmarks": rows(12)}).to_string();
        assert!(matches!(
            estimator.process_frame(payload.as_bytes()),
            Err(FormcheckError::Frame(FrameError::JointCount { actual: 12, .. }))
        ));

        assert!(estimator.process_frame(b"not json").is_err());
    }

    #[test]
    fn test_recording_skips_malformed_frames() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let recording = json!([
            {"landmarks": rows(JOINT_COUNT), "visible": true},
            {"landmarks": rows(5), "visible": true},
            {"landmarks": [], "visible": false},
            {"landmarks": rows(JOINT_COUNT)},
        ]);
        write!(file, "{}", recording).unwrap();

        let frames = LandmarkFileEstimator::new()
            .load_recording(file.path())
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|(_, visible)| *visible));
    }

    #[test]
    fn test_observations_keep_missing_poses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let recording = json!([
            {"landmarks": rows(JOINT_COUNT), "visible": true},
            {"landmarks": [], "visible": false},
            {"landmarks": rows(5)},
            {"landmarks": rows(JOINT_COUNT), "visible": false},
        ]);
        write!(file, "{}", recording).unwrap();

        let observations = LandmarkFileEstimator::new()
            .load_observations(file.path())
            .unwrap();
        assert_eq!(observations.len(), 3);
        assert!(observations[0].frame.is_some() && observations[0].is_visible);
        assert_eq!(observations[1], PoseObservation::no_pose());
        assert!(!observations[2].is_visible);
    }

    #[test]
    fn test_missing_recording_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = LandmarkFileEstimator::new().process_video_file(&dir.path().join("none.json"));
        assert!(matches!(result, Err(FormcheckError::Io(_))));
    }
}
