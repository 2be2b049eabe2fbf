use super::Classifier;
use crate::diagnostics::{diagnose, DiagnosticVerdict};
use crate::error::ClassifierError;
use crate::landmark::Frame;
use crate::windows::SlidingWindow;
use tracing::{debug, error, trace};

/// A window vote is kept only above this confidence
pub const VOTE_CONFIDENCE_THRESHOLD: f64 = 0.50;

/// Coarse pass: one label per visible window the classifier is confident about.
///
/// Hidden windows are skipped without calling the classifier. Votes at or
/// below `min_confidence`, and sentinel labels, are discarded. A classifier
/// failure aborts the pass.
pub fn classify_windows(
    classifier: &dyn Classifier,
    windows: &[SlidingWindow],
    min_confidence: f64,
) -> Result<Vec<String>, ClassifierError> {
    let mut labels = Vec::new();

    for (index, window) in windows.iter().enumerate() {
        if !window.is_visible() {
            trace!(
                "Skipping window {} (visibility {:.2})",
                index,
                window.visibility_ratio()
            );
            continue;
        }

        let vote = classifier.classify(window.frames()).map_err(|e| {
            error!("{} failed on window {}: {}", classifier.name(), index, e);
            e
        })?;

        if vote.confidence > min_confidence && !vote.is_sentinel() {
            debug!(
                "Window {} voted {} ({:.2})",
                index, vote.label, vote.confidence
            );
            labels.push(vote.label);
        } else {
            trace!(
                "Window {} vote discarded: {} ({:.2})",
                index,
                vote.label,
                vote.confidence
            );
        }
    }

    Ok(labels)
}

/// Detailed pass: diagnose every visible window as `forced_exercise`.
///
/// When no window is visible the whole `fallback_frames` sequence is diagnosed
/// as one unit instead.
pub fn analyze_windows_detailed(
    windows: &[SlidingWindow],
    forced_exercise: &str,
    fallback_frames: &[Frame],
) -> Vec<DiagnosticVerdict> {
    let verdicts: Vec<_> = windows
        .iter()
        .filter(|window| window.is_visible())
        .map(|window| diagnose(forced_exercise, window.frames(), None))
        .collect();

    if verdicts.is_empty() {
        debug!(
            "No visible window, diagnosing all {} frames as {}",
            fallback_frames.len(),
            forced_exercise
        );
        return vec![diagnose(forced_exercise, fallback_frames, None)];
    }

    verdicts
}
