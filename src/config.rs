use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct FormcheckConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub windows: WindowConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Real-time session state machine settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// Time spent in the setup phase before calibration starts
    #[serde(default = "default_setup_duration_ms")]
    pub setup_duration_ms: u64,

    /// Time spent collecting calibration votes
    #[serde(default = "default_calibration_duration_ms")]
    pub calibration_duration_ms: u64,

    /// Maximum frames retained per session
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Frames classified for one calibration vote
    #[serde(default = "default_calibration_window")]
    pub calibration_window: usize,

    /// Frames required before a training diagnosis
    #[serde(default = "default_training_window")]
    pub training_window: usize,

    /// Classify every Nth buffered frame during calibration
    #[serde(default = "default_prediction_interval")]
    pub prediction_interval: u64,

    /// Minimum fraction of recent frames flagged visible
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,

    /// Minimum vertical variance of a tracked joint to count as movement
    #[serde(default = "default_motion_threshold")]
    pub motion_threshold: f64,

    /// Fewest frames the motion check will judge
    #[serde(default = "default_min_motion_samples")]
    pub min_motion_samples: usize,

    /// Confidence needed for a calibration vote
    #[serde(default = "default_calibration_confidence")]
    pub calibration_confidence: f64,

    /// Confidence needed to trust a training diagnosis
    #[serde(default = "default_training_confidence")]
    pub training_confidence: f64,
}

/// Offline sliding-window settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WindowConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_window_step")]
    pub step: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// A window vote counts only above this confidence
    #[serde(default = "default_vote_confidence")]
    pub vote_confidence: f64,

    /// Heuristic classifier score below which a window is "no exercise"
    #[serde(default = "default_heuristic_min_score")]
    pub heuristic_min_score: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,

    /// Log every published event at debug level
    #[serde(default)]
    pub debug_logging: bool,
}

impl FormcheckConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("formcheck.toml")
    }

    /// Load configuration from a specific file path.
    ///
    /// Environment variables use the `FORMCHECK_` prefix with `__` between
    /// nested keys, e.g. `FORMCHECK_SESSION__TRAINING_WINDOW=45`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("session.setup_duration_ms", default_setup_duration_ms())?
            .set_default(
                "session.calibration_duration_ms",
                default_calibration_duration_ms(),
            )?
            .set_default("session.buffer_capacity", default_buffer_capacity() as u64)?
            .set_default(
                "session.calibration_window",
                default_calibration_window() as u64,
            )?
            .set_default("session.training_window", default_training_window() as u64)?
            .set_default("session.prediction_interval", default_prediction_interval())?
            .set_default(
                "session.visibility_threshold",
                default_visibility_threshold(),
            )?
            .set_default("session.motion_threshold", default_motion_threshold())?
            .set_default(
                "session.min_motion_samples",
                default_min_motion_samples() as u64,
            )?
            .set_default(
                "session.calibration_confidence",
                default_calibration_confidence(),
            )?
            .set_default(
                "session.training_confidence",
                default_training_confidence(),
            )?
            .set_default("windows.window_size", default_window_size() as u64)?
            .set_default("windows.step", default_window_step() as u64)?
            .set_default("classifier.vote_confidence", default_vote_confidence())?
            .set_default(
                "classifier.heuristic_min_score",
                default_heuristic_min_score(),
            )?
            .set_default("events.capacity", default_event_capacity() as u64)?
            .set_default("events.debug_logging", false)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with FORMCHECK_ prefix
            .add_source(
                Environment::with_prefix("FORMCHECK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: FormcheckConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session;

        if session.buffer_capacity == 0 {
            return Err(ConfigError::Message(
                "Session buffer_capacity must be greater than 0".to_string(),
            ));
        }

        if session.calibration_window == 0 || session.training_window == 0 {
            return Err(ConfigError::Message(
                "Session calibration_window and training_window must be greater than 0"
                    .to_string(),
            ));
        }

        if session.calibration_window > session.buffer_capacity
            || session.training_window > session.buffer_capacity
        {
            return Err(ConfigError::Message(format!(
                "Session windows must fit in the buffer of {} frames",
                session.buffer_capacity
            )));
        }

        if session.min_motion_samples > session.buffer_capacity {
            return Err(ConfigError::Message(format!(
                "Session min_motion_samples ({}) exceeds buffer_capacity ({})",
                session.min_motion_samples, session.buffer_capacity
            )));
        }

        if session.prediction_interval == 0 {
            return Err(ConfigError::Message(
                "Session prediction_interval must be greater than 0".to_string(),
            ));
        }

        if !(session.motion_threshold >= 0.0) {
            return Err(ConfigError::Message(
                "Session motion_threshold must not be negative".to_string(),
            ));
        }

        for (name, value) in [
            ("session.visibility_threshold", session.visibility_threshold),
            ("session.calibration_confidence", session.calibration_confidence),
            ("session.training_confidence", session.training_confidence),
            ("classifier.vote_confidence", self.classifier.vote_confidence),
            (
                "classifier.heuristic_min_score",
                self.classifier.heuristic_min_score,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Message(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.windows.window_size == 0 {
            return Err(ConfigError::Message(
                "Window size must be greater than 0".to_string(),
            ));
        }

        if self.windows.step == 0 {
            return Err(ConfigError::Message(
                "Window step must be greater than 0".to_string(),
            ));
        }

        if self.events.capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl SessionConfig {
    pub fn setup_duration(&self) -> Duration {
        Duration::from_millis(self.setup_duration_ms)
    }

    pub fn calibration_duration(&self) -> Duration {
        Duration::from_millis(self.calibration_duration_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            setup_duration_ms: default_setup_duration_ms(),
            calibration_duration_ms: default_calibration_duration_ms(),
            buffer_capacity: default_buffer_capacity(),
            calibration_window: default_calibration_window(),
            training_window: default_training_window(),
            prediction_interval: default_prediction_interval(),
            visibility_threshold: default_visibility_threshold(),
            motion_threshold: default_motion_threshold(),
            min_motion_samples: default_min_motion_samples(),
            calibration_confidence: default_calibration_confidence(),
            training_confidence: default_training_confidence(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            step: default_window_step(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            vote_confidence: default_vote_confidence(),
            heuristic_min_score: default_heuristic_min_score(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
            debug_logging: false,
        }
    }
}

// Default value functions
fn default_setup_duration_ms() -> u64 {
    3_000
}
fn default_calibration_duration_ms() -> u64 {
    8_000
}
fn default_buffer_capacity() -> usize {
    crate::frame_buffer::DEFAULT_BUFFER_CAPACITY
}
fn default_calibration_window() -> usize {
    30
}
fn default_training_window() -> usize {
    60
}
fn default_prediction_interval() -> u64 {
    5
}
fn default_visibility_threshold() -> f64 {
    0.7
}
fn default_motion_threshold() -> f64 {
    0.0005
}
fn default_min_motion_samples() -> usize {
    10
}
fn default_calibration_confidence() -> f64 {
    0.6
}
fn default_training_confidence() -> f64 {
    0.7
}

fn default_window_size() -> usize {
    crate::windows::DEFAULT_WINDOW_SIZE
}
fn default_window_step() -> usize {
    crate::windows::DEFAULT_WINDOW_STEP
}

fn default_vote_confidence() -> f64 {
    0.5
}
fn default_heuristic_min_score() -> f64 {
    0.3
}

fn default_event_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FormcheckConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.buffer_capacity, 60);
        assert_eq!(config.windows.window_size, 60);
        assert_eq!(config.windows.step, 15);
        assert_eq!(config.session.setup_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[session]\ncalibration_window = 5\nprediction_interval = 1\n\n\
             [windows]\nwindow_size = 45"
        )
        .unwrap();

        let config = FormcheckConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.session.calibration_window, 5);
        assert_eq!(config.session.prediction_interval, 1);
        assert_eq!(config.windows.window_size, 45);
        // Untouched keys keep their defaults
        assert_eq!(config.windows.step, 15);
        assert_eq!(config.events.capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormcheckConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.windows, WindowConfig::default());
    }

    #[test]
    fn test_environment_variable_override() {
        std::env::set_var("FORMCHECK_CLASSIFIER__HEURISTIC_MIN_SCORE", "0.45");

        let dir = tempfile::tempdir().unwrap();
        let config = FormcheckConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        std::env::remove_var("FORMCHECK_CLASSIFIER__HEURISTIC_MIN_SCORE");
        assert!((config.classifier.heuristic_min_score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_config_validation() {
        let mut config = FormcheckConfig::default();

        config.windows.step = 0;
        assert!(config.validate().is_err());
        config.windows.step = 15;

        config.session.training_window = 90;
        assert!(config.validate().is_err());
        config.session.training_window = 60;

        config.session.calibration_confidence = 1.5;
        assert!(config.validate().is_err());
        config.session.calibration_confidence = 0.6;

        config.session.motion_threshold = f64::NAN;
        assert!(config.validate().is_err());
        config.session.motion_threshold = 0.0005;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = FormcheckConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[session]"));
        let parsed: FormcheckConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
