// Configuration - Startup settings loaded from RON or JSON
// Missing fields fall back to defaults; values are checked by `validate`

use crate::messaging::channels::DEFAULT_COMMAND_CAPACITY;
use crate::pattern::{NotationError, Pattern};
use crate::render::strip::DEFAULT_VIEWPORT_WIDTH;
use crate::sequencer::clock::{AudioClock, TickSource, TriggerSink};
use crate::sequencer::scheduler::SchedulerSettings;
use crate::sequencer::tempo::{Tempo, TempoError};
use crate::sequencer::timeline::StripWidths;
use crate::sequencer::transport::Transport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    FileSystemError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    ValidationFailed(String),

    #[error("Invalid tempo: {0}")]
    Tempo(#[from] TempoError),

    #[error("Invalid pattern: {0}")]
    Notation(#[from] NotationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Strip geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub step_width: f64,
    pub bar_width: f64,
    pub viewport_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let widths = StripWidths::default();
        Self {
            step_width: widths.step_width,
            bar_width: widths.bar_width,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
        }
    }
}

/// Audio output settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Master volume in [0, 1]
    pub volume: f32,
    /// Depth of the command queue into the audio callback
    pub ring_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            ring_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrumConfig {
    pub tempo_bpm: u32,
    pub timing: SchedulerSettings,
    pub layout: LayoutConfig,
    pub audio: AudioConfig,
    /// Initial pattern in text notation (`"D..UUD..UUD. x4"`)
    pub pattern: Option<String>,
}

impl Default for StrumConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: Tempo::DEFAULT_BPM,
            timing: SchedulerSettings::default(),
            layout: LayoutConfig::default(),
            audio: AudioConfig::default(),
            pattern: None,
        }
    }
}

impl StrumConfig {
    /// `<config dir>/strumline/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("strumline").join("config.ron"))
    }

    pub fn from_ron_str(data: &str) -> ConfigResult<Self> {
        ron::from_str(data).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to deserialize from RON: {}", e))
        })
    }

    pub fn from_json_str(data: &str) -> ConfigResult<Self> {
        serde_json::from_str(data).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to deserialize from JSON: {}", e))
        })
    }

    pub fn to_ron_string(&self) -> ConfigResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize to RON: {}", e))
        })
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize to JSON: {}", e))
        })
    }

    /// Load and validate a config file; the format follows the extension
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let data = fs::read_to_string(path).map_err(|e| {
            ConfigError::FileSystemError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = match format {
            ConfigFormat::Ron => Self::from_ron_str(&data)?,
            ConfigFormat::Json => Self::from_json_str(&data)?,
        };
        config.validate()?;

        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load an explicit file, else the default file if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                tracing::debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let data = match ConfigFormat::from_path(path)? {
            ConfigFormat::Ron => self.to_ron_string()?,
            ConfigFormat::Json => self.to_json_string()?,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.tempo()?;

        if !is_positive(self.timing.lookahead_secs) {
            return Err(ConfigError::ValidationFailed(format!(
                "lookahead_secs must be positive (got {})",
                self.timing.lookahead_secs
            )));
        }
        if self.timing.stale_guard_secs.is_nan() || self.timing.stale_guard_secs < 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "stale_guard_secs must not be negative (got {})",
                self.timing.stale_guard_secs
            )));
        }

        for (name, value) in [
            ("step_width", self.layout.step_width),
            ("bar_width", self.layout.bar_width),
            ("viewport_width", self.layout.viewport_width),
        ] {
            if !is_positive(value) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be positive (got {})",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ConfigError::ValidationFailed(format!(
                "volume must be within [0, 1] (got {})",
                self.audio.volume
            )));
        }
        if self.audio.ring_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "ring_capacity must be at least 1".to_string(),
            ));
        }

        self.pattern()?;
        Ok(())
    }

    pub fn tempo(&self) -> ConfigResult<Tempo> {
        Ok(Tempo::new(self.tempo_bpm)?)
    }

    pub fn widths(&self) -> StripWidths {
        StripWidths::new(self.layout.step_width, self.layout.bar_width)
    }

    /// Parsed initial pattern, or the default strum when none is set
    pub fn pattern(&self) -> ConfigResult<Pattern> {
        match &self.pattern {
            Some(notation) => Ok(notation.parse()?),
            None => Ok(Pattern::default_strum()),
        }
    }

    /// Transport wired with this config's tempo, pattern, widths and timing
    pub fn build_transport<A, T>(&self, audio: A, ticks: T) -> ConfigResult<Transport<A, T>>
    where
        A: AudioClock + TriggerSink,
        T: TickSource,
    {
        Ok(Transport::new(audio, ticks)
            .with_widths(self.widths())
            .with_scheduler_settings(self.timing)
            .with_tempo(self.tempo()?)
            .with_pattern(self.pattern()?))
    }
}

/// False for NaN
fn is_positive(value: f64) -> bool {
    value > 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Ron,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Ok(Self::Ron),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::clock::{ManualClock, ManualTicks};
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = StrumConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tempo_bpm, 100);
        assert_eq!(config.widths(), StripWidths::new(50.0, 40.0));
        assert_eq!(config.pattern().unwrap(), Pattern::default_strum());
    }

    #[test]
    fn test_partial_ron() {
        let config = StrumConfig::from_ron_str(
            r#"(
                tempo_bpm: 90,
                timing: (lookahead_secs: 0.05),
                pattern: Some("D-U- x2"),
            )"#,
        )
        .unwrap();

        assert_eq!(config.tempo_bpm, 90);
        assert_eq!(config.timing.lookahead_secs, 0.05);
        assert_eq!(config.timing.stale_guard_secs, 0.1);
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.pattern().unwrap().total_steps(), 8);
    }

    #[test]
    fn test_json() {
        let config =
            StrumConfig::from_json_str(r#"{"tempo_bpm": 140, "audio": {"volume": 0.25}}"#)
                .unwrap();
        assert_eq!(config.tempo_bpm, 140);
        assert_eq!(config.audio.volume, 0.25);
        assert_eq!(config.audio.ring_capacity, DEFAULT_COMMAND_CAPACITY);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StrumConfig::default();
        config.tempo_bpm = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Tempo(_))));

        let mut config = StrumConfig::default();
        config.timing.lookahead_secs = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));

        let mut config = StrumConfig::default();
        config.timing.stale_guard_secs = -0.1;
        assert!(config.validate().is_err());

        let mut config = StrumConfig::default();
        config.layout.bar_width = 0.0;
        assert!(config.validate().is_err());

        let mut config = StrumConfig::default();
        config.layout.step_width = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = StrumConfig::default();
        config.audio.volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = StrumConfig::default();
        config.pattern = Some("D Q".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Notation(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut config = StrumConfig::default();
        config.tempo_bpm = 72;
        config.pattern = Some("DU x3".to_string());

        let ron_path = dir.path().join("nested").join("config.ron");
        config.save(&ron_path).unwrap();
        assert_eq!(StrumConfig::load(&ron_path).unwrap(), config);

        let json_path = dir.path().join("config.json");
        config.save(&json_path).unwrap();
        assert_eq!(StrumConfig::load(&json_path).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "tempo_bpm: 90").unwrap();
        assert!(matches!(
            StrumConfig::load(&yaml),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let missing = dir.path().join("missing.ron");
        assert!(matches!(
            StrumConfig::load(&missing),
            Err(ConfigError::FileSystemError(_))
        ));

        let broken = dir.path().join("broken.ron");
        std::fs::write(&broken, "(tempo_bpm: ").unwrap();
        assert!(matches!(
            StrumConfig::load(&broken),
            Err(ConfigError::SerializationError(_))
        ));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{"tempo_bpm": 1000}"#).unwrap();
        assert!(matches!(StrumConfig::load(&invalid), Err(ConfigError::Tempo(_))));
    }

    #[test]
    fn test_build_transport() {
        let mut config = StrumConfig::default();
        config.tempo_bpm = 120;
        config.layout.step_width = 25.0;
        config.pattern = Some("D.U.".to_string());

        let transport = config
            .build_transport(ManualClock::new(), ManualTicks::new())
            .unwrap();

        assert_eq!(transport.tempo().bpm(), 120);
        assert_eq!(transport.widths().step_width, 25.0);
        assert_eq!(transport.pattern().total_steps(), 4);
        assert_eq!(transport.scheduler_settings(), &config.timing);
    }
}
