use serde::{Deserialize, Serialize};

/// Exercises with a dedicated rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    DeepSquat,
    StandingShoulderAbduction,
    HurdleStep,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 3] = [
        ExerciseKind::DeepSquat,
        ExerciseKind::StandingShoulderAbduction,
        ExerciseKind::HurdleStep,
    ];

    /// Resolve a classifier label or display name.
    ///
    /// Matching ignores case and treats spaces, hyphens and underscores alike, so
    /// `"Deep Squat"`, `"deep-squat"` and `"deep_squat"` are the same exercise.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
    }

    /// Canonical label as emitted by the classifier
    pub fn label(self) -> &'static str {
        match self {
            ExerciseKind::DeepSquat => "deep_squat",
            ExerciseKind::StandingShoulderAbduction => "standing_shoulder_abduction",
            ExerciseKind::HurdleStep => "hurdle_step",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseKind::DeepSquat => "Deep Squat",
            ExerciseKind::StandingShoulderAbduction => "Standing Shoulder Abduction",
            ExerciseKind::HurdleStep => "Hurdle Step",
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Human-readable name for any exercise label, known or not
pub fn display_name(exercise_name: &str) -> String {
    match ExerciseKind::from_name(exercise_name) {
        Some(kind) => kind.display_name().to_string(),
        None => exercise_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_resolution() {
        assert_eq!(
            ExerciseKind::from_name("Deep Squat"),
            Some(ExerciseKind::DeepSquat)
        );
        assert_eq!(
            ExerciseKind::from_name(" standing-shoulder-abduction "),
            Some(ExerciseKind::StandingShoulderAbduction)
        );
        assert_eq!(
            ExerciseKind::from_name("HURDLE_STEP"),
            Some(ExerciseKind::HurdleStep)
        );
        assert_eq!(ExerciseKind::from_name("plank"), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("deep_squat"), "Deep Squat");
        assert_eq!(display_name("lunge"), "lunge");
    }
}
