// src/runtime.rs
//! Cooperative tick scheduler for the glove pipeline
//!
//! The runtime is the single-threaded consumer side of the pipeline: it
//! drains the serial line queue once per tick, routes decoded samples into
//! whichever stage is active (calibration window, template capture, or live
//! classification), and notifies the registered [`GestureConsumer`] at the
//! configured polling cadence. Multi-second operations are deadline-based
//! state machines advanced here; nothing in this module blocks.

use crate::calibration::{CalibrationEngine, CalibrationError, CalibrationEvent, CalibrationSummary};
use crate::config::GloveConfig;
use crate::error::GloveError;
use crate::frame::{parse_line, NormalizedFrame, RawSample};
use crate::gesture::capture::{CaptureError, CaptureRequest, TemplateCapture};
use crate::gesture::classifier::Classifier;
use crate::gesture::store::TemplateStore;
use crate::normalize::Normalizer;
use crate::orientation::OrientationFilter;
use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Receives classification outcomes once per poll tick.
///
/// Game frontends implement this instead of being dispatched by scene
/// index; the runtime neither knows nor cares what a gesture name means.
pub trait GestureConsumer {
    fn on_gesture(&mut self, name: &str);

    /// Called when no template matched. Explicit so consumers can tell
    /// "unclassified" apart from "stale".
    fn on_no_match(&mut self) {}
}

/// Shared modal-input flag.
///
/// While held (via [`InputGuard`]), the scheduler skips classification and
/// calibration ticks entirely; a modal prompt has the floor. Acquisitions
/// are counted, so nested guards keep the gate held until the last one
/// drops.
#[derive(Debug, Clone, Default)]
pub struct InputGate {
    holders: Arc<AtomicUsize>,
}

impl InputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_awaiting(&self) -> bool {
        self.holders.load(Ordering::SeqCst) > 0
    }

    /// Hold the gate for the duration of a modal operation. The guard
    /// releases it on drop, covering every exit path including cancellation.
    pub fn acquire(&self) -> InputGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        InputGuard {
            holders: Arc::clone(&self.holders),
        }
    }
}

/// Scoped hold on the awaiting-input gate.
pub struct InputGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for InputGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Tick-domain counters for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub ticks: u64,
    pub frames_parsed: u64,
    pub parse_errors: u64,
    pub matches: u64,
    pub no_matches: u64,
}

/// The cooperative game-logic domain: sole reader of the line queue, sole
/// owner of calibration state, normalized values, the template store, and
/// classifier output.
pub struct GloveRuntime {
    queue: Arc<SegQueue<String>>,
    calibration: CalibrationEngine,
    orientation_filter: OrientationFilter,
    normalizer: Option<Normalizer>,
    classifier: Classifier,
    capture: TemplateCapture,
    store: TemplateStore,
    gate: InputGate,
    device_reversed: bool,
    poll_interval: Duration,
    next_classify: Option<Instant>,
    current_frame: Option<NormalizedFrame>,
    stats: RuntimeStats,
    last_error: Option<GloveError>,
}

impl GloveRuntime {
    pub fn new(config: &GloveConfig, queue: Arc<SegQueue<String>>, store: TemplateStore) -> Self {
        Self {
            queue,
            calibration: CalibrationEngine::new(config.calibration.clone()),
            orientation_filter: OrientationFilter::new(config.matching.quaternion_threshold),
            normalizer: None,
            classifier: Classifier::new(config.matching.clone()),
            capture: TemplateCapture::new(config.capture.clone()),
            store,
            gate: InputGate::new(),
            device_reversed: config.display.device_reversed,
            poll_interval: Duration::from_millis(config.matching.poll_interval_ms),
            next_classify: None,
            current_frame: None,
            stats: RuntimeStats::default(),
            last_error: None,
        }
    }

    /// Handle to the modal-input gate for UI frontends.
    pub fn input_gate(&self) -> InputGate {
        self.gate.clone()
    }

    /// Begin (or restart) calibration. Clears the live normalization path
    /// until the run completes.
    pub fn start_calibration(&mut self, now: Instant) -> CalibrationEvent {
        self.normalizer = None;
        self.current_frame = None;
        self.orientation_filter.reset();
        self.capture.cancel();
        self.calibration.start(now)
    }

    /// Arm a template capture window. Requires completed calibration; a
    /// capture already in flight is cancelled cleanly.
    pub fn begin_capture(
        &mut self,
        request: CaptureRequest,
        now: Instant,
    ) -> Result<(), CaptureError> {
        if !self.calibration.is_calibrated() {
            return Err(CaptureError::NotCalibrated);
        }
        self.capture.begin(request, now)?;
        Ok(())
    }

    /// One scheduler tick: drain, route, advance deadlines, classify.
    pub fn tick(&mut self, now: Instant, consumer: &mut dyn GestureConsumer) {
        self.stats.ticks += 1;

        if self.gate.is_awaiting() {
            return;
        }

        self.drain_queue();
        self.advance_calibration(now);
        self.finish_capture(now);
        self.classify_if_due(now, consumer);
    }

    /// Most recent normalized frame, if the pipeline is live.
    pub fn current_frame(&self) -> Option<&NormalizedFrame> {
        self.current_frame.as_ref()
    }

    pub fn calibration_summary(&self) -> CalibrationSummary {
        self.calibration.summary()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Latest pipeline fault, cleared on read. Polled status, never thrown.
    pub fn take_last_error(&mut self) -> Option<GloveError> {
        self.last_error.take()
    }

    fn drain_queue(&mut self) {
        while let Some(line) = self.queue.pop() {
            match parse_line(&line) {
                Ok(sample) => {
                    self.stats.frames_parsed += 1;
                    self.route_sample(&sample);
                }
                Err(e) => {
                    self.stats.parse_errors += 1;
                    tracing::debug!(error = %e, line = %line, "malformed frame dropped");
                }
            }
        }
    }

    fn route_sample(&mut self, sample: &RawSample) {
        if self.calibration.is_collecting() {
            self.calibration.ingest(sample);
            return;
        }

        // Warmup dwell and idle: samples are deliberately discarded.
        let Some(normalizer) = &self.normalizer else {
            return;
        };

        let orientation = self.orientation_filter.apply(sample.orientation);
        let frame = NormalizedFrame {
            orientation,
            fingers: normalizer.normalize(sample),
        };

        if self.capture.is_sampling() {
            self.capture.ingest(&frame);
        }

        self.current_frame = Some(frame);
    }

    fn advance_calibration(&mut self, now: Instant) {
        if let Some(event) = self.calibration.advance(now) {
            if let CalibrationEvent::Completed { degraded } = event {
                self.normalizer = Some(Normalizer::new(
                    self.calibration.bounds().clone(),
                    self.device_reversed,
                ));
                if degraded {
                    self.last_error = Some(GloveError::Calibration(
                        CalibrationError::IncompleteWindow { phase: "collection" },
                    ));
                }
            }
        }
    }

    fn finish_capture(&mut self, now: Instant) {
        match self.capture.poll(now) {
            Some(Ok(template)) => {
                if let Err(e) = self.store.append(template) {
                    tracing::error!(error = %e, "failed to persist captured template");
                    self.last_error = Some(GloveError::Store(e));
                }
            }
            Some(Err(e)) => {
                self.last_error = Some(GloveError::Capture(e));
            }
            None => {}
        }
    }

    fn classify_if_due(&mut self, now: Instant, consumer: &mut dyn GestureConsumer) {
        if !self.calibration.is_calibrated() || self.capture.is_sampling() {
            return;
        }

        let due = self.next_classify.map_or(true, |at| now >= at);
        if !due {
            return;
        }
        self.next_classify = Some(now + self.poll_interval);

        let matched = self
            .current_frame
            .as_ref()
            .and_then(|frame| self.classifier.classify(frame, self.store.templates()));

        match matched {
            Some(template) => {
                self.stats.matches += 1;
                consumer.on_gesture(&template.name);
            }
            None => {
                self.stats.no_matches += 1;
                consumer.on_no_match();
            }
        }
    }
}
