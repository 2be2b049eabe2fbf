//! Human-readable reports for single verdicts and multi-window analyses.

use crate::diagnostics::{display_name, DiagnosticVerdict, Feedback, IssueDetail};

pub const NO_RESULT_AVAILABLE: &str = "No result available";

/// What a report is rendered from
#[derive(Debug, Clone, Copy)]
pub enum ReportSubject<'a> {
    Verdict(&'a DiagnosticVerdict),
    /// Per-window verdicts of an offline analysis, in sequence order
    Sequence(&'a [DiagnosticVerdict]),
}

impl<'a> From<&'a DiagnosticVerdict> for ReportSubject<'a> {
    fn from(verdict: &'a DiagnosticVerdict) -> Self {
        ReportSubject::Verdict(verdict)
    }
}

impl<'a> From<&'a [DiagnosticVerdict]> for ReportSubject<'a> {
    fn from(verdicts: &'a [DiagnosticVerdict]) -> Self {
        ReportSubject::Sequence(verdicts)
    }
}

/// Render a report; `None` or an empty sequence yields "No result available"
pub fn generate_report(subject: Option<ReportSubject<'_>>, exercise_name: &str) -> String {
    let exercise = display_name(exercise_name);

    match subject {
        None => format!("{} for {}.", NO_RESULT_AVAILABLE, exercise),
        Some(ReportSubject::Verdict(verdict)) => verdict_report(verdict, &exercise),
        Some(ReportSubject::Sequence([])) => format!("{} for {}.", NO_RESULT_AVAILABLE, exercise),
        Some(ReportSubject::Sequence([verdict])) => verdict_report(verdict, &exercise),
        Some(ReportSubject::Sequence(verdicts)) => sequence_report(verdicts, &exercise),
    }
}

fn verdict_report(verdict: &DiagnosticVerdict, exercise: &str) -> String {
    let mut lines = vec![format!("Exercise: {}", exercise)];

    if verdict.is_correct {
        lines.push("Result: Correct".to_string());
        match &verdict.feedback {
            Feedback::Message(message) => lines.push(message.clone()),
            _ => lines.push(format!(
                "Great work! Your {} was performed with correct form.",
                exercise
            )),
        }
        return lines.join("\n");
    }

    lines.push("Result: Needs improvement".to_string());
    match &verdict.feedback {
        Feedback::Issues(issues) => {
            lines.push("Areas for improvement:".to_string());
            for issue in issues {
                lines.push(format!("  - {}", describe(&issue.condition, &issue.detail)));
            }
        }
        Feedback::Message(message) => lines.push(format!("{}: {}", exercise, message)),
        Feedback::Correct => {}
    }

    lines.join("\n")
}

fn sequence_report(verdicts: &[DiagnosticVerdict], exercise: &str) -> String {
    let total = verdicts.len();
    let correct = verdicts.iter().filter(|v| v.is_correct).count();

    // Rule name -> (windows affected, distinct details), in first-seen order
    let mut issue_counts: Vec<(String, usize, Vec<String>)> = Vec::new();
    let mut messages: Vec<String> = Vec::new();

    for verdict in verdicts.iter().filter(|v| !v.is_correct) {
        match &verdict.feedback {
            Feedback::Issues(issues) => {
                for issue in issues {
                    let detail = match &issue.detail {
                        IssueDetail::Sides(sides) => Some(sides.clone()),
                        IssueDetail::Flag(_) => None,
                    };
                    match issue_counts.iter_mut().find(|(name, _, _)| *name == issue.condition) {
                        Some((_, count, details)) => {
                            *count += 1;
                            if let Some(detail) = detail {
                                if !details.contains(&detail) {
                                    details.push(detail);
                                }
                            }
                        }
                        None => issue_counts.push((
                            issue.condition.clone(),
                            1,
                            detail.into_iter().collect(),
                        )),
                    }
                }
            }
            Feedback::Message(message) => {
                if !messages.contains(message) {
                    messages.push(message.clone());
                }
            }
            Feedback::Correct => {}
        }
    }

    let mut lines = vec![
        format!("Exercise: {}", exercise),
        format!("Segments analyzed: {}", total),
        format!("Segments with correct form: {}/{}", correct, total),
    ];

    if correct == total {
        lines.push(format!(
            "Great work! Every segment of your {} was performed with correct form.",
            exercise
        ));
        return lines.join("\n");
    }

    if !issue_counts.is_empty() {
        lines.push("Areas for improvement:".to_string());
        for (name, count, details) in &issue_counts {
            let sides = if details.is_empty() {
                String::new()
            } else {
                format!(" [{}]", details.join("; "))
            };
            lines.push(format!("  - {}{}: {} of {} segments", name, sides, count, total));
        }
    }

    if !messages.is_empty() {
        lines.push("Notes:".to_string());
        for message in &messages {
            lines.push(format!("  - {}", message));
        }
    }

    lines.join("\n")
}

fn describe(condition: &str, detail: &IssueDetail) -> String {
    match detail {
        IssueDetail::Flag(_) => condition.to_string(),
        IssueDetail::Sides(sides) => format!("{} ({})", condition, sides),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Issue, NO_MOVEMENT_DETECTED};

    fn failing(issues: &[(&str, IssueDetail)]) -> DiagnosticVerdict {
        DiagnosticVerdict::from_issues(
            issues
                .iter()
                .map(|(name, detail)| Issue {
                    condition: name.to_string(),
                    detail: detail.clone(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_missing_result() {
        let report = generate_report(None, "deep_squat");
        assert!(report.contains(NO_RESULT_AVAILABLE));

        let empty: &[DiagnosticVerdict] = &[];
        assert!(generate_report(Some(empty.into()), "deep_squat").contains(NO_RESULT_AVAILABLE));
    }

    #[test]
    fn test_correct_report_names_exercise() {
        let verdict = DiagnosticVerdict::correct();
        let report = generate_report(Some((&verdict).into()), "deep_squat");
        assert!(report.contains("Deep Squat"));
        assert!(report.contains("correct form"));
    }

    #[test]
    fn test_failing_report_lists_every_rule() {
        let verdict = failing(&[
            ("Squat too shallow", IssueDetail::Flag(true)),
            ("Heels rising", IssueDetail::Sides("L, R".to_string())),
        ]);
        let report = generate_report(Some((&verdict).into()), "deep_squat");

        assert!(report.contains("Areas for improvement"));
        assert!(report.contains("Squat too shallow"));
        assert!(report.contains("Heels rising (L, R)"));
    }

    #[test]
    fn test_message_passes_through() {
        let verdict = DiagnosticVerdict::message(false, NO_MOVEMENT_DETECTED);
        let report = generate_report(Some((&verdict).into()), "standing_shoulder_abduction");
        assert!(report.contains("Standing Shoulder Abduction"));
        assert!(report.contains(NO_MOVEMENT_DETECTED));
    }

    #[test]
    fn test_sequence_summarizes_all_windows() {
        let verdicts = vec![
            failing(&[("Knee Valgus (Collapse)", IssueDetail::Sides("L".to_string()))]),
            failing(&[
                ("Knee Valgus (Collapse)", IssueDetail::Sides("L, R".to_string())),
                ("Squat too shallow", IssueDetail::Flag(true)),
            ]),
            DiagnosticVerdict::correct(),
        ];
        let report = generate_report(Some(verdicts.as_slice().into()), "deep_squat");

        assert!(report.contains("Segments with correct form: 1/3"));
        assert!(report.contains("Knee Valgus (Collapse) [L; L, R]: 2 of 3 segments"));
        assert!(report.contains("Squat too shallow: 1 of 3 segments"));
    }

    #[test]
    fn test_sequence_all_correct() {
        let verdicts = vec![DiagnosticVerdict::correct(); 4];
        let report = generate_report(Some(verdicts.as_slice().into()), "hurdle_step");
        assert!(report.contains("4/4"));
        assert!(report.contains("Every segment"));
    }
}
