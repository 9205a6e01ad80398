//! Glove-Core: sensor-glove gesture acquisition and matching library
//!
//! Reads a quaternion-plus-flex data stream from a serial-attached sensor
//! glove, calibrates each finger's range of motion, normalizes live readings
//! into openness percentages, and matches them against user-recorded gesture
//! templates. It features:
//!
//! - Serial hardware abstraction with a scripted source for tests
//! - Lock-free handoff between the reader thread and the game-logic domain
//! - Deadline-based calibration and capture state machines
//! - Tolerance-banded first-match gesture classification
//! - JSON-persisted gesture template store
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use glove_core::config::GloveConfig;
//! use glove_core::gesture::store::TemplateStore;
//! use glove_core::hal::{SerialLinkReader, SerialPortSource};
//! use glove_core::runtime::{GestureConsumer, GloveRuntime};
//! use std::time::Instant;
//!
//! struct Printer;
//!
//! impl GestureConsumer for Printer {
//!     fn on_gesture(&mut self, name: &str) {
//!         println!("matched: {}", name);
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GloveConfig::load("glove.toml")?;
//!     let store = TemplateStore::load(&config.store.path)?;
//!
//!     let mut reader = SerialLinkReader::new();
//!     reader.start(Box::new(SerialPortSource::open(&config.serial)?))?;
//!
//!     let mut runtime = GloveRuntime::new(&config, reader.queue(), store);
//!     runtime.start_calibration(Instant::now());
//!
//!     let mut printer = Printer;
//!     loop {
//!         runtime.tick(Instant::now(), &mut printer);
//!         std::thread::sleep(std::time::Duration::from_millis(20));
//!     }
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod calibration;
pub mod config;
pub mod error;
pub mod frame;
pub mod gesture;
pub mod hal;
pub mod normalize;
pub mod orientation;
pub mod runtime;
pub mod utils;

// Re-export commonly used types for convenience
pub use calibration::{CalibrationBounds, CalibrationEngine, CalibrationEvent, CalibrationPhase};
pub use config::GloveConfig;
pub use error::{GloveError, GloveResult};
pub use frame::{parse_line, NormalizedFrame, Quaternion, RawSample, FLEX_CHANNELS};
pub use gesture::{Classifier, GestureTemplate, TemplateCapture, TemplateStore};
pub use hal::{LineSource, SerialLinkReader, SerialPortSource};
pub use normalize::Normalizer;
pub use orientation::OrientationFilter;
pub use runtime::{GestureConsumer, GloveRuntime, InputGate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "glove-core");
    }
}
