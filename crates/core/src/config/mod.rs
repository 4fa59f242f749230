use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{FlickerError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Reads a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.playback.validate()?;
        Ok(config)
    }
}

/// Timing and zoom parameters for one playback controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Time each state stays on the surface before a preference is restored.
    pub initial_interval_ms: f64,
    /// Speed-up commands are ignored once the interval is at or below this.
    pub min_interval_ms: f64,
    /// Slow-down commands are ignored once the interval is at or above this.
    pub max_interval_ms: f64,
    /// Frequency change applied by one speed command.
    pub speed_step_hz: f64,
    /// Zoom step as a fraction of the surface's base scale.
    pub zoom_step_fraction: f64,
    /// Smallest scale as a fraction of the surface's base scale.
    pub min_scale_fraction: f64,
    /// Cadence of the repeat while a control is held.
    pub repeat_cadence_ms: f64,
    pub features: FeatureFlags,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 25.0,
            min_interval_ms: 10.0,
            max_interval_ms: 400.0,
            speed_step_hz: 2.5,
            zoom_step_fraction: 0.025,
            min_scale_fraction: 0.01,
            repeat_cadence_ms: 150.0,
            features: FeatureFlags::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("initial_interval_ms", self.initial_interval_ms),
            ("min_interval_ms", self.min_interval_ms),
            ("max_interval_ms", self.max_interval_ms),
            ("speed_step_hz", self.speed_step_hz),
            ("zoom_step_fraction", self.zoom_step_fraction),
            ("min_scale_fraction", self.min_scale_fraction),
            ("repeat_cadence_ms", self.repeat_cadence_ms),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(FlickerError::InvalidConfig(format!(
                    "`{name}` must be a positive number, got {value}"
                )));
            }
        }
        if self.min_interval_ms >= self.max_interval_ms {
            return Err(FlickerError::InvalidConfig(format!(
                "`min_interval_ms` ({}) must be below `max_interval_ms` ({})",
                self.min_interval_ms, self.max_interval_ms
            )));
        }
        if !(self.min_interval_ms..=self.max_interval_ms).contains(&self.initial_interval_ms) {
            return Err(FlickerError::InvalidConfig(format!(
                "`initial_interval_ms` ({}) must lie within [{}, {}]",
                self.initial_interval_ms, self.min_interval_ms, self.max_interval_ms
            )));
        }
        Ok(())
    }
}

/// Build-time ablations of the full controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub persistence: bool,
    pub controls: bool,
    pub autostart: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            persistence: true,
            controls: true,
            autostart: true,
        }
    }
}

/// Where preferences are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix of both preference keys.
    pub namespace: String,
    /// Preference file. Defaults to the platform config directory.
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: "flicker".to_string(),
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PlaybackConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_interval_bounds() {
        let config = PlaybackConfig {
            min_interval_ms: 500.0,
            ..PlaybackConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("min_interval_ms"));
    }

    #[test]
    fn rejects_initial_interval_outside_bounds() {
        for initial_interval_ms in [5.0, 1000.0] {
            let config = PlaybackConfig {
                initial_interval_ms,
                ..PlaybackConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(format!("{err}").contains("initial_interval_ms"));
        }
    }

    #[test]
    fn rejects_zero_repeat_cadence() {
        let config = PlaybackConfig {
            repeat_cadence_ms: 0.0,
            ..PlaybackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FlickerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "playback": { "initial_interval_ms": 40, "features": { "controls": false } } }"#,
        )
        .unwrap();

        assert_eq!(config.playback.initial_interval_ms, 40.0);
        assert_eq!(config.playback.repeat_cadence_ms, 150.0);
        assert!(!config.playback.features.controls);
        assert!(config.playback.features.persistence);
        assert_eq!(config.storage.namespace, "flicker");
    }
}
