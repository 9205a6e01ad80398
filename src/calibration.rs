// src/calibration.rs
//! Two-phase range-of-motion calibration
//!
//! The operator holds a fist for one averaging window, then an open hand for
//! another. Each window reduces to a per-finger mean; the smaller of the two
//! means becomes the finger's raw minimum, the larger its maximum. A finger
//! whose fist mean exceeds its open mean is flagged reversed (sensor polarity
//! varies by physical mount). An initial dwell lets the IMU's internal
//! filter settle before any sampling.
//!
//! All timing is deadline-based and checked once per scheduler tick; nothing
//! here blocks a thread.

use crate::frame::{RawSample, FLEX_CHANNELS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

/// Calibration timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Dwell before sampling starts, letting the IMU filter settle.
    pub warmup_secs: f32,
    /// Length of each averaging window (fist, then open hand).
    pub window_secs: f32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            warmup_secs: 15.0,
            window_secs: 5.0,
        }
    }
}

impl CalibrationSettings {
    pub fn warmup(&self) -> Duration {
        Duration::from_secs_f32(self.warmup_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs_f32(self.window_secs)
    }
}

/// Per-finger raw-value bounds produced by a calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationBounds {
    pub min: [f32; FLEX_CHANNELS],
    pub max: [f32; FLEX_CHANNELS],
    /// True where the raw fist mean exceeded the raw open mean.
    pub reversed: [bool; FLEX_CHANNELS],
}

impl Default for CalibrationBounds {
    fn default() -> Self {
        Self {
            min: [0.0; FLEX_CHANNELS],
            max: [0.0; FLEX_CHANNELS],
            reversed: [false; FLEX_CHANNELS],
        }
    }
}

impl CalibrationBounds {
    /// A finger with no usable span cannot be normalized; the normalizer
    /// clamps it to 0 instead of dividing.
    pub fn is_degenerate(&self, finger: usize) -> bool {
        (self.max[finger] - self.min[finger]).abs() <= f32::EPSILON
    }
}

/// Calibration state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    Idle,
    SensorWarmup,
    CollectingFist,
    CollectingOpen,
    Calibrated,
}

/// Phase transitions surfaced to the operator display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationEvent {
    WarmupStarted,
    FistWindowStarted,
    OpenWindowStarted,
    Completed { degraded: bool },
}

/// Calibration status errors
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// A collection window ended with zero samples; calibration completed
    /// with that side of the bounds left at its prior/default values.
    IncompleteWindow { phase: &'static str },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::IncompleteWindow { phase } => {
                write!(f, "calibration window '{}' received no samples", phase)
            }
        }
    }
}

impl Error for CalibrationError {}

/// Snapshot of a run for status polling and operator display.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSummary {
    pub phase: CalibrationPhase,
    pub bounds: CalibrationBounds,
    pub degraded: bool,
    /// Per-finger flag for spans too narrow to normalize; those fingers
    /// read 0 until the operator re-runs calibration.
    pub degenerate: [bool; FLEX_CHANNELS],
}

/// Deadline-driven calibration engine.
///
/// Owned by the cooperative tick domain. `start` is re-entrant: calling it
/// from any phase resets to the warmup dwell and clears prior bounds.
pub struct CalibrationEngine {
    settings: CalibrationSettings,
    phase: CalibrationPhase,
    deadline: Option<Instant>,
    sums: [f64; FLEX_CHANNELS],
    count: u32,
    fist_mean: Option<[f32; FLEX_CHANNELS]>,
    open_mean: Option<[f32; FLEX_CHANNELS]>,
    bounds: CalibrationBounds,
    degraded: bool,
}

impl CalibrationEngine {
    pub fn new(settings: CalibrationSettings) -> Self {
        Self {
            settings,
            phase: CalibrationPhase::Idle,
            deadline: None,
            sums: [0.0; FLEX_CHANNELS],
            count: 0,
            fist_mean: None,
            open_mean: None,
            bounds: CalibrationBounds::default(),
            degraded: false,
        }
    }

    /// Begin (or restart) a calibration run.
    pub fn start(&mut self, now: Instant) -> CalibrationEvent {
        self.phase = CalibrationPhase::SensorWarmup;
        self.deadline = Some(now + self.settings.warmup());
        self.sums = [0.0; FLEX_CHANNELS];
        self.count = 0;
        self.fist_mean = None;
        self.open_mean = None;
        self.bounds = CalibrationBounds::default();
        self.degraded = false;
        tracing::info!(warmup_secs = self.settings.warmup_secs, "calibration started");
        CalibrationEvent::WarmupStarted
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_calibrated(&self) -> bool {
        self.phase == CalibrationPhase::Calibrated
    }

    /// True while a fist/open averaging window is open.
    pub fn is_collecting(&self) -> bool {
        matches!(
            self.phase,
            CalibrationPhase::CollectingFist | CalibrationPhase::CollectingOpen
        )
    }

    /// Feed one decoded sample into the current averaging window.
    ///
    /// Samples arriving outside a collection window (warmup dwell, idle) are
    /// ignored. Malformed frames never reach here; the parser drops them, so
    /// they do not advance the sample counter.
    pub fn ingest(&mut self, sample: &RawSample) {
        if !self.is_collecting() {
            return;
        }
        for (sum, &raw) in self.sums.iter_mut().zip(sample.flex.iter()) {
            *sum += raw as f64;
        }
        self.count += 1;
    }

    /// Check the current phase deadline, performing at most one transition.
    ///
    /// Called once per scheduler tick. Returns the transition event for the
    /// operator display, if one fired.
    pub fn advance(&mut self, now: Instant) -> Option<CalibrationEvent> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        match self.phase {
            CalibrationPhase::SensorWarmup => {
                self.begin_window(now);
                self.phase = CalibrationPhase::CollectingFist;
                tracing::info!("calibration window started: make a fist");
                Some(CalibrationEvent::FistWindowStarted)
            }
            CalibrationPhase::CollectingFist => {
                self.fist_mean = self.close_window("fist");
                self.begin_window(now);
                self.phase = CalibrationPhase::CollectingOpen;
                tracing::info!("calibration window started: open your hand");
                Some(CalibrationEvent::OpenWindowStarted)
            }
            CalibrationPhase::CollectingOpen => {
                self.open_mean = self.close_window("open");
                self.finalize();
                self.phase = CalibrationPhase::Calibrated;
                self.deadline = None;
                tracing::info!(degraded = self.degraded, "calibration completed");
                Some(CalibrationEvent::Completed { degraded: self.degraded })
            }
            CalibrationPhase::Idle | CalibrationPhase::Calibrated => None,
        }
    }

    pub fn bounds(&self) -> &CalibrationBounds {
        &self.bounds
    }

    pub fn summary(&self) -> CalibrationSummary {
        CalibrationSummary {
            phase: self.phase,
            bounds: self.bounds.clone(),
            degraded: self.degraded,
            degenerate: std::array::from_fn(|i| {
                self.phase == CalibrationPhase::Calibrated && self.bounds.is_degenerate(i)
            }),
        }
    }

    /// Status flag for the operator: set when any window closed empty.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn begin_window(&mut self, now: Instant) {
        self.sums = [0.0; FLEX_CHANNELS];
        self.count = 0;
        self.deadline = Some(now + self.settings.window());
    }

    fn close_window(&mut self, label: &'static str) -> Option<[f32; FLEX_CHANNELS]> {
        if self.count == 0 {
            self.degraded = true;
            tracing::warn!(window = label, "calibration window received no samples");
            return None;
        }
        let mut mean = [0.0f32; FLEX_CHANNELS];
        for (slot, sum) in mean.iter_mut().zip(self.sums.iter()) {
            *slot = (sum / self.count as f64) as f32;
        }
        Some(mean)
    }

    fn finalize(&mut self) {
        // An empty window leaves that side at the cleared defaults rather
        // than aborting; the run completes degraded and the operator is
        // expected to re-run it.
        let fist = self.fist_mean.unwrap_or([0.0; FLEX_CHANNELS]);
        let open = self.open_mean.unwrap_or([0.0; FLEX_CHANNELS]);

        for i in 0..FLEX_CHANNELS {
            self.bounds.min[i] = fist[i].min(open[i]);
            self.bounds.max[i] = fist[i].max(open[i]);
            self.bounds.reversed[i] = fist[i] > open[i];
            tracing::debug!(
                finger = crate::frame::FINGER_NAMES[i],
                min = self.bounds.min[i],
                max = self.bounds.max[i],
                reversed = self.bounds.reversed[i],
                "finger bounds"
            );
            if self.bounds.is_degenerate(i) {
                tracing::warn!(
                    finger = crate::frame::FINGER_NAMES[i],
                    "no usable calibration span, finger will read 0"
                );
            }
        }
    }
}
