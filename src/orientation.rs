// src/orientation.rs
//! Dead-zone filtering of the orientation stream
//!
//! Low-amplitude IMU jitter would otherwise leak straight into template
//! matching and the hand-model display. The filter keeps the last accepted
//! quaternion and replaces it only when any single component moves further
//! than the threshold; the replacement is all-or-nothing across the four
//! components, so no per-axis lag asymmetry is introduced.

use crate::frame::Quaternion;

#[derive(Debug, Clone)]
pub struct OrientationFilter {
    threshold: f32,
    accepted: Option<Quaternion>,
}

impl OrientationFilter {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            accepted: None,
        }
    }

    /// Feed one incoming orientation; returns the accepted value.
    ///
    /// The first quaternion seen is accepted unconditionally. `None` input
    /// (inertial firmware variant) leaves the state untouched.
    pub fn apply(&mut self, incoming: Option<Quaternion>) -> Option<Quaternion> {
        if let Some(q) = incoming {
            match self.accepted {
                None => self.accepted = Some(q),
                Some(prev) => {
                    if prev.max_component_delta(&q) > self.threshold {
                        self.accepted = Some(q);
                    }
                }
            }
        }
        self.accepted
    }

    pub fn current(&self) -> Option<Quaternion> {
        self.accepted
    }

    pub fn reset(&mut self) {
        self.accepted = None;
    }
}
