// src/normalize.rs
//! Raw flex readings to canonical finger openness
//!
//! Maps each raw potentiometer value through its calibration bounds into a
//! 0..100 "openness" percentage, where 100 is fully extended regardless of
//! how the sensor is physically mounted. Two reversal layers compose by XOR:
//! the per-finger flag discovered during calibration, and a uniform
//! device-level flip from configuration.

use crate::calibration::CalibrationBounds;
use crate::frame::{RawSample, FLEX_CHANNELS};

/// Smallest calibration span treated as usable. Anything narrower is a
/// degenerate calibration and normalizes to 0 instead of dividing.
pub const MIN_SPAN: f32 = 1e-6;

/// Normalize one raw reading against `[min, max]`.
///
/// Without reversal, `min` maps to 100 (open) and `max` to 0 (fist); with
/// reversal the sense flips. Output is always within [0, 100] and never
/// NaN or infinite.
pub fn normalize_reading(raw: f32, min: f32, max: f32, reversed: bool) -> f32 {
    let span = max - min;
    if span.abs() <= MIN_SPAN {
        return 0.0;
    }

    let scaled = ((raw - min) / span * 100.0).clamp(0.0, 100.0);
    if reversed {
        scaled
    } else {
        100.0 - scaled
    }
}

/// Applies calibration bounds to whole samples.
#[derive(Debug, Clone)]
pub struct Normalizer {
    bounds: CalibrationBounds,
    device_reversed: bool,
}

impl Normalizer {
    pub fn new(bounds: CalibrationBounds, device_reversed: bool) -> Self {
        Self {
            bounds,
            device_reversed,
        }
    }

    pub fn normalize(&self, sample: &RawSample) -> [f32; FLEX_CHANNELS] {
        std::array::from_fn(|i| {
            normalize_reading(
                sample.flex[i],
                self.bounds.min[i],
                self.bounds.max[i],
                self.bounds.reversed[i] ^ self.device_reversed,
            )
        })
    }

    pub fn bounds(&self) -> &CalibrationBounds {
        &self.bounds
    }
}
