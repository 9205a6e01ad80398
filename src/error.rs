// src/error.rs
//! Unified error handling for the glove pipeline
//!
//! Module-level errors (serial, parse, config, store, capture, calibration)
//! are wrapped into one enum so callers outside the pipeline handle a single
//! type. Failures never cross the serial-thread/game-thread boundary as
//! errors; they surface as dropped data or polled status.

use crate::calibration::CalibrationError;
use crate::config::ConfigError;
use crate::frame::FrameParseError;
use crate::gesture::capture::CaptureError;
use crate::gesture::store::StoreError;
use crate::hal::line_source::SerialError;
use std::error::Error;
use std::fmt;

/// Unified error type for glove pipeline operations.
#[derive(Debug)]
pub enum GloveError {
    Serial(SerialError),
    Parse(FrameParseError),
    Config(ConfigError),
    Calibration(CalibrationError),
    Store(StoreError),
    Capture(CaptureError),
}

impl fmt::Display for GloveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GloveError::Serial(e) => write!(f, "[SERIAL] {}", e),
            GloveError::Parse(e) => write!(f, "[PARSE] {}", e),
            GloveError::Config(e) => write!(f, "[CONFIG] {}", e),
            GloveError::Calibration(e) => write!(f, "[CALIBRATION] {}", e),
            GloveError::Store(e) => write!(f, "[STORE] {}", e),
            GloveError::Capture(e) => write!(f, "[CAPTURE] {}", e),
        }
    }
}

impl Error for GloveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GloveError::Serial(e) => Some(e),
            GloveError::Parse(e) => Some(e),
            GloveError::Config(e) => Some(e),
            GloveError::Calibration(e) => Some(e),
            GloveError::Store(e) => Some(e),
            GloveError::Capture(e) => Some(e),
        }
    }
}

impl From<SerialError> for GloveError {
    fn from(err: SerialError) -> Self {
        GloveError::Serial(err)
    }
}

impl From<FrameParseError> for GloveError {
    fn from(err: FrameParseError) -> Self {
        GloveError::Parse(err)
    }
}

impl From<ConfigError> for GloveError {
    fn from(err: ConfigError) -> Self {
        GloveError::Config(err)
    }
}

impl From<CalibrationError> for GloveError {
    fn from(err: CalibrationError) -> Self {
        GloveError::Calibration(err)
    }
}

impl From<StoreError> for GloveError {
    fn from(err: StoreError) -> Self {
        GloveError::Store(err)
    }
}

impl From<CaptureError> for GloveError {
    fn from(err: CaptureError) -> Self {
        GloveError::Capture(err)
    }
}

/// Result type alias for glove pipeline operations.
pub type GloveResult<T> = Result<T, GloveError>;
