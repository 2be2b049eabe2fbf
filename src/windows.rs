//! Sliding windows over a recorded landmark sequence.

use crate::landmark::Frame;
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_WINDOW_SIZE: usize = 60;
pub const DEFAULT_WINDOW_STEP: usize = 15;

/// Minimum fraction of visible frames for a window to be trusted
pub const VISIBLE_RATIO_THRESHOLD: f64 = 0.7;

/// Immutable view of a contiguous run of frames
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    source: Arc<[Frame]>,
    range: Range<usize>,
    visibility_ratio: f64,
}

impl SlidingWindow {
    /// Window over `range` of `source`, with visibility counted from `visibility`
    pub fn new(source: Arc<[Frame]>, range: Range<usize>, visibility: &[bool]) -> Self {
        let visibility_ratio = visible_ratio(visibility, range.clone());
        Self {
            source,
            range,
            visibility_ratio,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.source[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Index of the first frame in the source sequence
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn visibility_ratio(&self) -> f64 {
        self.visibility_ratio
    }

    pub fn is_visible(&self) -> bool {
        self.visibility_ratio >= VISIBLE_RATIO_THRESHOLD
    }
}

/// Fraction of frames in `range` flagged visible; missing flags count as not visible
pub fn visible_ratio(visibility: &[bool], range: Range<usize>) -> f64 {
    let total = range.len();
    if total == 0 {
        return 0.0;
    }
    let visible = range
        .filter(|&i| visibility.get(i).copied().unwrap_or(false))
        .count();
    visible as f64 / total as f64
}

/// Slice a sequence into overlapping windows.
///
/// A sequence shorter than `window_size` becomes one window holding every frame.
/// Otherwise windows start at `0, step, 2 * step, ...` for as long as a full
/// window fits; a trailing remainder shorter than a window is dropped. Zero sizes
/// are treated as 1.
pub fn build_windows(
    frames: &[Frame],
    visibility: &[bool],
    window_size: usize,
    step: usize,
) -> Vec<SlidingWindow> {
    if frames.is_empty() {
        return Vec::new();
    }

    let window_size = window_size.max(1);
    let step = step.max(1);
    let source: Arc<[Frame]> = Arc::from(frames);

    if frames.len() < window_size {
        debug!(
            "Sequence of {} frames is shorter than a window of {}, using a single window",
            frames.len(),
            window_size
        );
        return vec![SlidingWindow::new(source, 0..frames.len(), visibility)];
    }

    let windows: Vec<_> = (0..=frames.len() - window_size)
        .step_by(step)
        .map(|start| {
            SlidingWindow::new(Arc::clone(&source), start..start + window_size, visibility)
        })
        .collect();

    debug!(
        "Built {} windows of {} frames (step {}) from {} frames",
        windows.len(),
        window_size,
        step,
        frames.len()
    );

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, JOINT_COUNT};

    fn frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| {
                Frame::new(vec![Landmark::new(0.5, i as f64 / 1000.0, 0.0); JOINT_COUNT]).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_short_sequence_is_one_window() {
        let frames = frames(30);
        let windows = build_windows(&frames, &[true; 30], 60, 15);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len(), 30);
        assert_eq!(windows[0].frames(), frames.as_slice());
        assert!(windows[0].is_visible());
    }

    #[test]
    fn test_long_sequence_overlaps() {
        let frames = frames(120);
        let windows = build_windows(&frames, &[true; 120], 60, 15);
        assert_eq!(windows.len(), 5);
        assert!(windows.iter().all(|w| w.len() == 60));
        let starts: Vec<_> = windows.iter().map(SlidingWindow::start).collect();
        assert_eq!(starts, vec![0, 15, 30, 45, 60]);
        assert_eq!(windows[1].frames()[0], frames[15]);
    }

    #[test]
    fn test_trailing_remainder_is_dropped() {
        // 100 frames: windows at 0, 15, 30; frames 90..100 never start a window
        let windows = build_windows(&frames(100), &[true; 100], 60, 15);
        assert_eq!(windows.len(), 3);
        let last = windows.last().unwrap();
        assert_eq!(last.start() + last.len(), 90);
    }

    #[test]
    fn test_exact_fit_is_one_full_window() {
        let windows = build_windows(&frames(60), &[true; 60], 60, 15);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len(), 60);
    }

    #[test]
    fn test_empty_sequence_has_no_windows() {
        assert!(build_windows(&[], &[], 60, 15).is_empty());
    }

    #[test]
    fn test_visibility_ratio_per_window() {
        let frames = frames(120);
        let mut visibility = vec![true; 120];
        for flag in visibility.iter_mut().take(30) {
            *flag = false;
        }

        let windows = build_windows(&frames, &visibility, 60, 15);
        assert!((windows[0].visibility_ratio() - 0.5).abs() < 1e-9);
        assert!(!windows[0].is_visible());
        assert!((windows[1].visibility_ratio() - 0.75).abs() < 1e-9);
        assert!(windows[1].is_visible());
        assert!(windows[2].is_visible());
    }

    #[test]
    fn test_visibility_threshold_is_inclusive() {
        let mut visibility = vec![true; 10];
        visibility[..3].fill(false);
        let windows = build_windows(&frames(10), &visibility, 60, 15);
        assert!(windows[0].is_visible());
    }

    #[test]
    fn test_missing_visibility_counts_as_hidden() {
        let windows = build_windows(&frames(10), &[true; 5], 60, 15);
        assert!((windows[0].visibility_ratio() - 0.5).abs() < 1e-9);
        assert!(!windows[0].is_visible());
    }

    #[test]
    fn test_zero_step_is_clamped() {
        let windows = build_windows(&frames(62), &[true; 62], 60, 0);
        assert_eq!(windows.len(), 3);
    }
}
