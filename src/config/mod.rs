// src/config/mod.rs
//! Configuration management
//!
//! A single TOML file covers the serial link, calibration timing, matching
//! thresholds, capture timing, and the informational display table. Every
//! field has a default so a missing file (or any missing section) is usable
//! as-is; there is no hot reload, one glove session runs one static config.

use crate::calibration::CalibrationSettings;
use crate::frame::FLEX_CHANNELS;
use crate::gesture::capture::CaptureSettings;
use crate::gesture::classifier::MatchingSettings;
use crate::hal::serial_link::SerialLinkConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Complete glove pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GloveConfig {
    pub serial: SerialLinkConfig,
    pub calibration: CalibrationSettings,
    pub matching: MatchingSettings,
    pub capture: CaptureSettings,
    pub display: DisplaySettings,
    pub store: StoreSettings,
}

/// Informational display settings and device-level orientation flip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Per-finger maximum range-of-motion in degrees (thumb first). Used
    /// only for display angles, never for classification.
    pub finger_rom_degrees: [f32; FLEX_CHANNELS],
    /// Uniform flip of the normalized sense for every finger, layered on
    /// top of per-finger calibration reversal.
    pub device_reversed: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            finger_rom_degrees: [60.0, 90.0, 90.0, 90.0, 90.0],
            device_reversed: false,
        }
    }
}

/// Template store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: "hand_states.json".to_string(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "configuration IO error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "configuration parse error: {}", msg),
            ConfigError::Invalid(errors) => {
                write!(f, "configuration validation errors:")?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl GloveConfig {
    /// Load configuration from a TOML file. A missing file yields the
    /// defaults; a present but invalid file is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: GloveConfig = toml::from_str(&content)?;
        config.validate_consistency().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.matching.quaternion_threshold <= 0.0 {
            errors.push(format!(
                "quaternion threshold must be positive, got {}",
                self.matching.quaternion_threshold
            ));
        }

        if self.matching.finger_threshold <= 0.0 || self.matching.finger_threshold >= 50.0 {
            errors.push(format!(
                "finger threshold must be in (0, 50), got {}",
                self.matching.finger_threshold
            ));
        }

        if self.matching.poll_interval_ms == 0 {
            errors.push("classification poll interval must be at least 1 ms".to_string());
        }

        if self.calibration.warmup_secs < 0.0 {
            errors.push(format!(
                "calibration warmup must be non-negative, got {}",
                self.calibration.warmup_secs
            ));
        }

        if self.calibration.window_secs <= 0.0 {
            errors.push(format!(
                "calibration window must be positive, got {}",
                self.calibration.window_secs
            ));
        }

        if self.capture.window_secs <= 0.0 {
            errors.push(format!(
                "capture window must be positive, got {}",
                self.capture.window_secs
            ));
        }

        if self
            .display
            .finger_rom_degrees
            .iter()
            .any(|&deg| !(0.0..=180.0).contains(&deg))
        {
            errors.push("finger range-of-motion degrees must be within [0, 180]".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
