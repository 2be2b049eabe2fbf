//! Offline analysis of a complete landmark sequence.
//!
//! The pipeline is stateless: windows are built, classified by majority vote,
//! then every visible window is diagnosed as the winning exercise.

use crate::classifier::{analyze_windows_detailed, classify_windows, Classifier, VoteTally};
use crate::config::WindowConfig;
use crate::diagnostics::DiagnosticVerdict;
use crate::error::{AnalysisError, Result};
use crate::landmark::Frame;
use crate::report::{generate_report, ReportSubject};
use crate::windows::build_windows;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Result of analyzing a recorded sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub exercise: String,
    /// Share of window votes won by `exercise`
    pub voting_confidence: f64,
    pub votes: VoteTally,
    pub windows_total: usize,
    pub windows_visible: usize,
    /// Per-window verdicts in sequence order
    pub verdicts: Vec<DiagnosticVerdict>,
    pub report: String,
    /// Correctness of the final verdict
    pub is_correct: bool,
    /// Feedback of the final verdict
    pub feedback: String,
}

pub struct VideoAnalysisPipeline<'a> {
    classifier: &'a dyn Classifier,
    windows: &'a WindowConfig,
    vote_confidence: f64,
}

impl<'a> VideoAnalysisPipeline<'a> {
    pub fn new(
        classifier: &'a dyn Classifier,
        windows: &'a WindowConfig,
        vote_confidence: f64,
    ) -> Self {
        Self {
            classifier,
            windows,
            vote_confidence,
        }
    }

    /// Analyze `frames`, with `visibility[i]` flagging whether frame `i` was fully visible.
    ///
    /// The overall `is_correct` and `feedback` come from the last window's verdict,
    /// describing how the movement ended rather than an aggregate.
    pub fn run(&self, frames: &[Frame], visibility: &[bool]) -> Result<VideoAnalysis> {
        if frames.is_empty() {
            warn!("Video analysis requested for an empty sequence");
            return Err(AnalysisError::NoPersonDetected.into());
        }

        let windows = build_windows(
            frames,
            visibility,
            self.windows.window_size,
            self.windows.step,
        );
        let windows_visible = windows.iter().filter(|w| w.is_visible()).count();

        let labels = classify_windows(self.classifier, &windows, self.vote_confidence)?;
        let votes: VoteTally = labels.iter().collect();

        let Some((exercise, winner_votes)) = votes.winner() else {
            info!(
                "No confident exercise in {} windows ({} visible)",
                windows.len(),
                windows_visible
            );
            return Err(AnalysisError::NoConfidentExercise.into());
        };
        let exercise = exercise.to_string();
        let voting_confidence = winner_votes as f64 / votes.total() as f64;
        debug!(
            "Vote winner {} with {}/{} votes",
            exercise,
            winner_votes,
            votes.total()
        );

        let verdicts = analyze_windows_detailed(&windows, &exercise, frames);
        let Some(last) = verdicts.last() else {
            return Err(AnalysisError::AnalysisFailed.into());
        };
        let is_correct = last.is_correct;
        let feedback = last.feedback.summary();

        let report = generate_report(Some(ReportSubject::Sequence(&verdicts)), &exercise);

        info!(
            "Video analyzed: {} ({:.0}% of votes), {} segments, final correct={}",
            exercise,
            voting_confidence * 100.0,
            verdicts.len(),
            is_correct
        );

        Ok(VideoAnalysis {
            exercise,
            voting_confidence,
            votes,
            windows_total: windows.len(),
            windows_visible,
            verdicts,
            report,
            is_correct,
            feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationVote, HeuristicClassifier, NO_EXERCISE};
    use crate::diagnostics::fixtures::squat_cycle;
    use crate::error::{ClassifierError, FormcheckError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        votes: Vec<(&'static str, f64)>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(votes: Vec<(&'static str, f64)>) -> Self {
            Self {
                votes,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for Scripted {
        fn classify(
            &self,
            _window: &[Frame],
        ) -> std::result::Result<ClassificationVote, ClassifierError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let (label, confidence) = self.votes[call % self.votes.len()];
            Ok(ClassificationVote::new(label, confidence))
        }
    }

    fn run(
        classifier: &dyn Classifier,
        frames: &[Frame],
        visibility: &[bool],
    ) -> Result<VideoAnalysis> {
        let windows = WindowConfig::default();
        VideoAnalysisPipeline::new(classifier, &windows, 0.5).run(frames, visibility)
    }

    fn analysis_error(result: Result<VideoAnalysis>) -> AnalysisError {
        match result {
            Err(FormcheckError::Analysis(e)) => e,
            other => panic!("expected an analysis error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sequence_has_no_person() {
        let classifier = Scripted::new(vec![("deep_squat", 0.9)]);
        let error = analysis_error(run(&classifier, &[], &[]));
        assert_eq!(error, AnalysisError::NoPersonDetected);
        assert_eq!(error.to_string(), "no person detected");
    }

    #[test]
    fn test_no_confident_votes() {
        let frames = squat_cycle(120, 0.85);

        let sentinel = Scripted::new(vec![(NO_EXERCISE, 0.99)]);
        let error = analysis_error(run(&sentinel, &frames, &vec![true; 120]));
        assert_eq!(error, AnalysisError::NoConfidentExercise);

        // Exactly at the threshold is not above it
        let weak = Scripted::new(vec![("deep_squat", 0.5)]);
        let error = analysis_error(run(&weak, &frames, &vec![true; 120]));
        assert_eq!(error, AnalysisError::NoConfidentExercise);
    }

    #[test]
    fn test_hidden_sequence_is_never_classified() {
        let classifier = Scripted::new(vec![("deep_squat", 0.9)]);
        let frames = squat_cycle(120, 0.85);
        let error = analysis_error(run(&classifier, &frames, &vec![false; 120]));
        assert_eq!(error, AnalysisError::NoConfidentExercise);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_majority_vote_and_confidence() {
        let classifier = Scripted::new(vec![
            ("deep_squat", 0.9),
            ("hurdle_step", 0.9),
            ("deep_squat", 0.8),
            (NO_EXERCISE, 0.9),
            ("deep_squat", 0.7),
        ]);
        let frames = squat_cycle(120, 0.85);

        let analysis = run(&classifier, &frames, &vec![true; 120]).unwrap();

        assert_eq!(analysis.exercise, "deep_squat");
        assert_eq!(analysis.windows_total, 5);
        assert_eq!(analysis.windows_visible, 5);
        assert_eq!(analysis.votes.total(), 4);
        assert!((analysis.voting_confidence - 0.75).abs() < 1e-9);
        assert_eq!(analysis.verdicts.len(), 5);
        assert!(analysis.is_correct);
        assert!(analysis.report.contains("Segments analyzed: 5"));
    }

    #[test]
    fn test_vote_tie_goes_to_first_label() {
        let classifier = Scripted::new(vec![("hurdle_step", 0.9), ("deep_squat", 0.9)]);
        let frames = squat_cycle(75, 0.85);

        // 75 frames give two windows, one vote each
        let analysis = run(&classifier, &frames, &vec![true; 75]).unwrap();
        assert_eq!(analysis.exercise, "hurdle_step");
        assert!((analysis.voting_confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_last_window_decides_overall_result() {
        let classifier = Scripted::new(vec![("deep_squat", 0.9)]);

        // Four windows reach depth, the final window (60..120) stays shallow
        let mut frames = squat_cycle(60, 0.85);
        frames.extend(squat_cycle(60, 0.7));
        let analysis = run(&classifier, &frames, &vec![true; 120]).unwrap();

        let correct = analysis.verdicts.iter().filter(|v| v.is_correct).count();
        assert_eq!(correct, 4);
        assert!(!analysis.is_correct);
        assert_eq!(analysis.feedback, "Squat too shallow");
        assert!(analysis.report.contains("Segments with correct form: 4/5"));

        // And the reverse: only the ending counts
        let mut frames = squat_cycle(60, 0.7);
        frames.extend(squat_cycle(60, 0.85));
        let analysis = run(&classifier, &frames, &vec![true; 120]).unwrap();

        assert!(analysis.verdicts.iter().any(|v| !v.is_correct));
        assert!(analysis.is_correct);
    }

    #[test]
    fn test_detailed_pass_skips_hidden_windows() {
        let classifier = Scripted::new(vec![("deep_squat", 0.9)]);
        let frames = squat_cycle(120, 0.85);
        let mut visibility = vec![true; 120];
        visibility[80..].iter_mut().for_each(|v| *v = false);

        let analysis = run(&classifier, &frames, &visibility).unwrap();

        // Windows starting at 45 and 60 see 25 or more hidden frames
        assert_eq!(analysis.windows_visible, 3);
        assert_eq!(analysis.verdicts.len(), 3);
    }

    #[test]
    fn test_heuristic_classifier_end_to_end() {
        let classifier = HeuristicClassifier::default();
        let frames = squat_cycle(120, 0.85);

        let analysis = run(&classifier, &frames, &vec![true; 120]).unwrap();

        assert_eq!(analysis.exercise, "deep_squat");
        assert!(analysis.voting_confidence > 0.99);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["exercise"], "deep_squat");
    }
}
