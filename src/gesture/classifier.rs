// src/gesture/classifier.rs
//! Tolerance-banded nearest-template matching
//!
//! Runs at a fixed polling cadence against the current normalized frame.
//! Templates are scanned in stored order and the first one passing all of
//! its included checks wins; ties are resolved by insertion order, never by
//! distance. Finger comparison is extremum-aware: two values both saturated
//! against the same physical limit count as equal regardless of their exact
//! distance, which absorbs sensor noise at the ends of travel.

use crate::frame::{NormalizedFrame, FLEX_CHANNELS};
use crate::gesture::template::{mask, GestureTemplate};
use serde::{Deserialize, Serialize};

/// Matching thresholds and cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Per-component quaternion tolerance.
    pub quaternion_threshold: f32,
    /// Finger percentage tolerance; also the near-extremum band width.
    pub finger_threshold: f32,
    /// Classification polling interval.
    pub poll_interval_ms: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            quaternion_threshold: 0.05,
            finger_threshold: 15.0,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    settings: MatchingSettings,
}

impl Classifier {
    pub fn new(settings: MatchingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MatchingSettings {
        &self.settings
    }

    /// First template in stored order matching the frame, if any.
    pub fn classify<'a>(
        &self,
        frame: &NormalizedFrame,
        templates: &'a [GestureTemplate],
    ) -> Option<&'a GestureTemplate> {
        templates.iter().find(|t| self.matches(frame, t))
    }

    fn matches(&self, frame: &NormalizedFrame, template: &GestureTemplate) -> bool {
        if template.includes_orientation {
            // A frame without orientation (inertial firmware) can never
            // satisfy an orientation-including template.
            let Some(q) = frame.orientation else {
                return false;
            };
            let current = q.components();
            for i in 0..4 {
                if !mask::includes(template.orientation_mask, i) {
                    continue;
                }
                if (current[i] - template.orientation[i]).abs() > self.settings.quaternion_threshold
                {
                    return false;
                }
            }
        }

        if template.includes_fingers {
            for i in 0..FLEX_CHANNELS {
                if !self.finger_matches(frame.fingers[i], template.fingers[i]) {
                    return false;
                }
            }
        }

        true
    }

    fn finger_matches(&self, current: f32, reference: f32) -> bool {
        let threshold = self.settings.finger_threshold;
        let near = |a: f32, b: f32| (a - b).abs() <= threshold;

        // Both saturated against the same end of travel: match regardless
        // of their exact distance from each other.
        if near(current, 100.0) && near(reference, 100.0) {
            return true;
        }
        if near(current, 0.0) && near(reference, 0.0) {
            return true;
        }

        near(current, reference)
    }
}
