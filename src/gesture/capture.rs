// src/gesture/capture.rs
//! Timed template capture
//!
//! Builds a new gesture template by averaging the live normalized stream
//! over a fixed window. The window is deadline-based: the runtime feeds
//! frames in while it is open and polls for the finished template once per
//! tick. Only one capture can be in flight; beginning a new one cancels the
//! old one cleanly, dropping its partial accumulation.

use crate::frame::{NormalizedFrame, FLEX_CHANNELS};
use crate::gesture::template::{mask, GestureTemplate, TemplateError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

/// Capture timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Length of the sampling window.
    pub window_secs: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self { window_secs: 5.0 }
    }
}

impl CaptureSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs_f32(self.window_secs)
    }
}

/// What to record in the new template.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub name: String,
    pub include_orientation: bool,
    pub include_fingers: bool,
    pub orientation_mask: u8,
}

impl CaptureRequest {
    fn validate(&self) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if !self.include_orientation && !self.include_fingers {
            return Err(TemplateError::NoComponents);
        }
        if self.orientation_mask & !mask::ALL != 0 {
            return Err(TemplateError::InvalidMask(self.orientation_mask));
        }
        if self.include_orientation && self.orientation_mask & mask::ALL == 0 {
            return Err(TemplateError::EmptyMask);
        }
        Ok(())
    }
}

/// Capture errors
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    InvalidRequest(TemplateError),
    /// The window closed without a single usable frame.
    NoSamples,
    /// Capture requires a completed calibration.
    NotCalibrated,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::InvalidRequest(e) => write!(f, "invalid capture request: {}", e),
            CaptureError::NoSamples => write!(f, "capture window received no samples"),
            CaptureError::NotCalibrated => write!(f, "capture requires completed calibration"),
        }
    }
}

impl Error for CaptureError {}

impl From<TemplateError> for CaptureError {
    fn from(err: TemplateError) -> Self {
        CaptureError::InvalidRequest(err)
    }
}

struct ActiveCapture {
    request: CaptureRequest,
    deadline: Instant,
    orientation_sums: [f64; 4],
    orientation_count: u32,
    finger_sums: [f64; FLEX_CHANNELS],
    finger_count: u32,
}

/// Deadline-driven capture routine.
#[derive(Default)]
pub struct TemplateCapture {
    settings: CaptureSettings,
    active: Option<ActiveCapture>,
}

impl TemplateCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            active: None,
        }
    }

    /// Arm a capture window. Returns `true` if a prior in-flight capture was
    /// cancelled to make room.
    pub fn begin(&mut self, request: CaptureRequest, now: Instant) -> Result<bool, CaptureError> {
        request.validate()?;

        let cancelled = self.active.is_some();
        if cancelled {
            tracing::debug!("in-flight capture cancelled by new request");
        }

        tracing::info!(name = %request.name, window_secs = self.settings.window_secs, "capture started");
        self.active = Some(ActiveCapture {
            request,
            deadline: now + self.settings.window(),
            orientation_sums: [0.0; 4],
            orientation_count: 0,
            finger_sums: [0.0; FLEX_CHANNELS],
            finger_count: 0,
        });
        Ok(cancelled)
    }

    pub fn is_sampling(&self) -> bool {
        self.active.is_some()
    }

    /// Drop any in-flight capture and its partial accumulation.
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("capture cancelled");
        }
    }

    /// Accumulate one normalized frame into the open window.
    pub fn ingest(&mut self, frame: &NormalizedFrame) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        if active.request.include_orientation {
            if let Some(q) = frame.orientation {
                let components = q.components();
                for i in 0..4 {
                    if mask::includes(active.request.orientation_mask, i) {
                        active.orientation_sums[i] += components[i] as f64;
                    }
                }
                active.orientation_count += 1;
            }
        }

        if active.request.include_fingers {
            for (sum, &value) in active.finger_sums.iter_mut().zip(frame.fingers.iter()) {
                *sum += value as f64;
            }
            active.finger_count += 1;
        }
    }

    /// Close the window if its deadline has passed, reducing the accumulated
    /// frames to one template.
    pub fn poll(&mut self, now: Instant) -> Option<Result<GestureTemplate, CaptureError>> {
        let active = self.active.take()?;
        if now < active.deadline {
            self.active = Some(active);
            return None;
        }

        let wanted_orientation = active.request.include_orientation;
        let wanted_fingers = active.request.include_fingers;

        if (wanted_orientation && active.orientation_count == 0)
            || (wanted_fingers && active.finger_count == 0)
        {
            tracing::warn!(name = %active.request.name, "capture window closed empty");
            return Some(Err(CaptureError::NoSamples));
        }

        let mut orientation = [0.0f32; 4];
        if wanted_orientation {
            for i in 0..4 {
                if mask::includes(active.request.orientation_mask, i) {
                    orientation[i] =
                        (active.orientation_sums[i] / active.orientation_count as f64) as f32;
                }
            }
        }

        let mut fingers = [0.0f32; FLEX_CHANNELS];
        if wanted_fingers {
            for (slot, sum) in fingers.iter_mut().zip(active.finger_sums.iter()) {
                *slot = (sum / active.finger_count as f64) as f32;
            }
        }

        tracing::info!(name = %active.request.name, "capture completed");
        Some(Ok(GestureTemplate {
            name: active.request.name,
            orientation,
            fingers,
            includes_orientation: wanted_orientation,
            includes_fingers: wanted_fingers,
            orientation_mask: active.request.orientation_mask,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Quaternion;

    fn fingers_request(name: &str) -> CaptureRequest {
        CaptureRequest {
            name: name.to_string(),
            include_orientation: false,
            include_fingers: true,
            orientation_mask: mask::ALL,
        }
    }

    fn frame(fingers: [f32; FLEX_CHANNELS], q: Option<Quaternion>) -> NormalizedFrame {
        NormalizedFrame {
            orientation: q,
            fingers,
        }
    }

    fn settings() -> CaptureSettings {
        CaptureSettings { window_secs: 5.0 }
    }

    #[test]
    fn test_capture_averages_fingers() {
        let mut capture = TemplateCapture::new(settings());
        let t0 = Instant::now();
        capture.begin(fingers_request("half"), t0).unwrap();

        capture.ingest(&frame([40.0; 5], None));
        capture.ingest(&frame([60.0; 5], None));

        assert!(capture.poll(t0 + Duration::from_secs(1)).is_none());
        let template = capture
            .poll(t0 + Duration::from_secs(6))
            .unwrap()
            .unwrap();
        assert_eq!(template.fingers, [50.0; 5]);
        assert!(template.includes_fingers);
        assert!(!template.includes_orientation);
        assert!(!capture.is_sampling());
    }

    #[test]
    fn test_capture_masks_orientation_components() {
        let mut capture = TemplateCapture::new(settings());
        let t0 = Instant::now();
        capture
            .begin(
                CaptureRequest {
                    name: "align".to_string(),
                    include_orientation: true,
                    include_fingers: false,
                    orientation_mask: mask::QX | mask::QZ,
                },
                t0,
            )
            .unwrap();

        capture.ingest(&frame([0.0; 5], Some(Quaternion::new(0.9, 0.2, 0.5, -0.4))));
        let template = capture
            .poll(t0 + Duration::from_secs(6))
            .unwrap()
            .unwrap();

        // Masked-out components are zeroed, selected ones carry the mean
        assert_eq!(template.orientation[0], 0.0);
        assert!((template.orientation[1] - 0.2).abs() < 1e-6);
        assert_eq!(template.orientation[2], 0.0);
        assert!((template.orientation[3] - -0.4).abs() < 1e-6);
    }

    #[test]
    fn test_new_capture_cancels_prior() {
        let mut capture = TemplateCapture::new(settings());
        let t0 = Instant::now();
        capture.begin(fingers_request("one"), t0).unwrap();
        capture.ingest(&frame([10.0; 5], None));

        let cancelled = capture.begin(fingers_request("two"), t0).unwrap();
        assert!(cancelled);

        capture.ingest(&frame([80.0; 5], None));
        let template = capture
            .poll(t0 + Duration::from_secs(6))
            .unwrap()
            .unwrap();
        // Partial accumulation from the cancelled capture is gone
        assert_eq!(template.name, "two");
        assert_eq!(template.fingers, [80.0; 5]);
    }

    #[test]
    fn test_empty_window_reports_no_samples() {
        let mut capture = TemplateCapture::new(settings());
        let t0 = Instant::now();
        capture.begin(fingers_request("ghost"), t0).unwrap();
        let result = capture.poll(t0 + Duration::from_secs(6)).unwrap();
        assert_eq!(result, Err(CaptureError::NoSamples));
    }

    #[test]
    fn test_invalid_request_rejected() {
        let mut capture = TemplateCapture::new(settings());
        let request = CaptureRequest {
            name: String::new(),
            include_orientation: false,
            include_fingers: true,
            orientation_mask: mask::ALL,
        };
        assert!(matches!(
            capture.begin(request, Instant::now()),
            Err(CaptureError::InvalidRequest(TemplateError::EmptyName))
        ));
        assert!(!capture.is_sampling());
    }

    #[test]
    fn test_explicit_cancel_drops_state() {
        let mut capture = TemplateCapture::new(settings());
        let t0 = Instant::now();
        capture.begin(fingers_request("x"), t0).unwrap();
        capture.cancel();
        assert!(!capture.is_sampling());
        assert!(capture.poll(t0 + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_orientation_frames_without_quaternion_not_counted() {
        let mut capture = TemplateCapture::new(settings());
        let t0 = Instant::now();
        capture
            .begin(
                CaptureRequest {
                    name: "align".to_string(),
                    include_orientation: true,
                    include_fingers: false,
                    orientation_mask: mask::ALL,
                },
                t0,
            )
            .unwrap();

        capture.ingest(&frame([0.0; 5], None));
        let result = capture.poll(t0 + Duration::from_secs(6)).unwrap();
        assert_eq!(result, Err(CaptureError::NoSamples));
    }
}
