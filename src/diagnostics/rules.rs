use super::verdict::{Issue, IssueDetail};
use crate::landmark::Frame;
use tracing::trace;

/// One row of an exercise rule table.
///
/// `check` returns the detail to report when the rule is violated.
pub(crate) struct Rule<M> {
    pub name: &'static str,
    pub check: fn(&M) -> Option<IssueDetail>,
}

/// Evaluate every rule in table order and collect all violations
pub(crate) fn evaluate<M>(rules: &[Rule<M>], measurements: &M) -> Vec<Issue> {
    let mut issues = Vec::new();

    for rule in rules {
        if let Some(detail) = (rule.check)(measurements) {
            trace!("Rule '{}' violated: {}", rule.name, detail);
            issues.push(Issue {
                condition: rule.name.to_string(),
                detail,
            });
        }
    }

    issues
}

/// Index of the frame maximizing `score`; non-finite scores are ignored and the
/// last frame is used when nothing is finite
pub(crate) fn select_frame<F>(frames: &[Frame], score: F) -> usize
where
    F: Fn(&Frame) -> f64,
{
    let mut best: Option<(usize, f64)> = None;

    for (index, frame) in frames.iter().enumerate() {
        let value = score(frame);
        if !value.is_finite() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((index, value)),
        }
    }

    best.map(|(index, _)| index)
        .unwrap_or_else(|| frames.len().saturating_sub(1))
}

/// Largest finite value, or `fallback` when there is none
pub(crate) fn peak<I>(values: I, fallback: f64) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .unwrap_or(fallback)
}

/// Smallest finite value, or `fallback` when there is none
pub(crate) fn trough<I>(values: I, fallback: f64) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        value: f64,
    }

    const RULES: &[Rule<Sample>] = &[
        Rule {
            name: "Too small",
            check: |m| (m.value < 1.0).then_some(IssueDetail::Flag(true)),
        },
        Rule {
            name: "Negative",
            check: |m| (m.value < 0.0).then_some(IssueDetail::Flag(true)),
        },
    ];

    #[test]
    fn test_all_failing_rules_reported_in_order() {
        let issues = evaluate(RULES, &Sample { value: -1.0 });
        let names: Vec<_> = issues.iter().map(|i| i.condition.as_str()).collect();
        assert_eq!(names, vec!["Too small", "Negative"]);

        assert!(evaluate(RULES, &Sample { value: 2.0 }).is_empty());
    }

    #[test]
    fn test_peak_and_trough_skip_nan() {
        assert_eq!(peak([1.0, f64::NAN, 3.0, 2.0], 0.0), 3.0);
        assert_eq!(trough([1.0, f64::NAN, -3.0], 0.0), -3.0);
        assert_eq!(peak([f64::NAN], 7.0), 7.0);
        assert_eq!(trough(Vec::<f64>::new(), 7.0), 7.0);
    }
}
