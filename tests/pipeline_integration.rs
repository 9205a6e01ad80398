// tests/pipeline_integration.rs
//! End-to-end pipeline tests: serial reader thread through calibration,
//! normalization, capture, and classification.

use crossbeam::queue::SegQueue;
use glove_core::calibration::CalibrationSettings;
use glove_core::config::GloveConfig;
use glove_core::gesture::template::{mask, GestureTemplate};
use glove_core::gesture::store::TemplateStore;
use glove_core::hal::{ScriptedLineSource, SerialLinkReader};
use glove_core::runtime::{GestureConsumer, GloveRuntime};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Recorder {
    gestures: Vec<String>,
    no_matches: usize,
}

impl GestureConsumer for Recorder {
    fn on_gesture(&mut self, name: &str) {
        self.gestures.push(name.to_string());
    }

    fn on_no_match(&mut self) {
        self.no_matches += 1;
    }
}

fn fast_config() -> GloveConfig {
    let mut config = GloveConfig::default();
    config.calibration = CalibrationSettings {
        warmup_secs: 1.0,
        window_secs: 1.0,
    };
    config
}

fn fingers_template(name: &str, fingers: [f32; 5]) -> GestureTemplate {
    GestureTemplate {
        name: name.to_string(),
        orientation: [0.0; 4],
        fingers,
        includes_orientation: false,
        includes_fingers: true,
        orientation_mask: mask::ALL,
    }
}

/// Calibrate with fist at raw 600 and open hand at raw 400, driving the
/// deadlines with manufactured instants. Returns the instant after
/// completion.
fn calibrate(
    runtime: &mut GloveRuntime,
    queue: &SegQueue<String>,
    consumer: &mut Recorder,
    t0: Instant,
) -> Instant {
    runtime.start_calibration(t0);

    let t1 = t0 + Duration::from_secs(2);
    runtime.tick(t1, consumer);

    queue.push("1,0,0,0,600,600,600,600,600".to_string());
    runtime.tick(t1 + Duration::from_millis(100), consumer);

    let t2 = t1 + Duration::from_secs(2);
    runtime.tick(t2, consumer);

    queue.push("1,0,0,0,400,400,400,400,400".to_string());
    runtime.tick(t2 + Duration::from_millis(100), consumer);

    let t3 = t2 + Duration::from_secs(2);
    runtime.tick(t3, consumer);
    assert!(runtime.is_calibrated());
    t3
}

#[test]
fn test_reader_thread_feeds_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path().join("states.json"));
    store.append(fingers_template("half", [50.0; 5])).unwrap();

    let mut reader = SerialLinkReader::new();
    let queue = reader.queue();
    let mut runtime = GloveRuntime::new(&fast_config(), reader.queue(), store);
    let mut consumer = Recorder::default();

    // Open the fist window before the reader starts delivering, so its
    // lines land inside the window rather than the warmup dwell.
    let t0 = Instant::now();
    runtime.start_calibration(t0);
    let t1 = t0 + Duration::from_secs(2);
    runtime.tick(t1, &mut consumer);

    reader
        .start(Box::new(ScriptedLineSource::new([
            "1,0,0,0,600,600,600,600,600",
        ])))
        .unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while queue.is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    reader.stop();
    assert_eq!(reader.stats().lines_received(), 1);
    runtime.tick(t1 + Duration::from_millis(100), &mut consumer);

    let t2 = t1 + Duration::from_secs(2);
    runtime.tick(t2, &mut consumer);
    queue.push("1,0,0,0,400,400,400,400,400".to_string());
    runtime.tick(t2 + Duration::from_millis(100), &mut consumer);

    let t3 = t2 + Duration::from_secs(2);
    runtime.tick(t3, &mut consumer);
    assert!(runtime.is_calibrated());

    queue.push("1,0,0,0,500,500,500,500,500".to_string());
    runtime.tick(t3 + Duration::from_millis(200), &mut consumer);
    assert_eq!(consumer.gestures, vec!["half"]);
}

#[test]
fn test_first_match_order_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path().join("states.json"));
    // Both templates tolerate a frame at 50 percent; the earlier one wins.
    store.append(fingers_template("first", [45.0; 5])).unwrap();
    store.append(fingers_template("second", [55.0; 5])).unwrap();

    let queue = Arc::new(SegQueue::new());
    let mut runtime = GloveRuntime::new(&fast_config(), Arc::clone(&queue), store);
    let mut consumer = Recorder::default();
    let t = calibrate(&mut runtime, &queue, &mut consumer, Instant::now());

    queue.push("1,0,0,0,500,500,500,500,500".to_string());
    runtime.tick(t + Duration::from_millis(200), &mut consumer);

    assert_eq!(consumer.gestures, vec!["first"]);
}

#[test]
fn test_malformed_lines_do_not_break_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path().join("states.json"));
    store.append(fingers_template("half", [50.0; 5])).unwrap();

    let queue = Arc::new(SegQueue::new());
    let mut runtime = GloveRuntime::new(&fast_config(), Arc::clone(&queue), store);
    let mut consumer = Recorder::default();
    let t = calibrate(&mut runtime, &queue, &mut consumer, Instant::now());

    queue.push("garbage".to_string());
    queue.push("1,0,0,nope,500,500,500,500,500".to_string());
    queue.push("1,0,0,0,500,500,500,500,500".to_string());
    runtime.tick(t + Duration::from_millis(200), &mut consumer);

    assert_eq!(runtime.stats().parse_errors, 2);
    assert_eq!(consumer.gestures, vec!["half"]);
}

#[test]
fn test_inertial_variant_classifies_finger_templates() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path().join("states.json"));
    store.append(fingers_template("half", [50.0; 5])).unwrap();

    let queue = Arc::new(SegQueue::new());
    let mut runtime = GloveRuntime::new(&fast_config(), Arc::clone(&queue), store);
    let mut consumer = Recorder::default();

    // Calibrate using the 11-field firmware variant (no quaternion)
    let t0 = Instant::now();
    runtime.start_calibration(t0);
    let t1 = t0 + Duration::from_secs(2);
    runtime.tick(t1, &mut consumer);
    queue.push("0.1,0.2,0.3,1.0,2.0,3.0,600,600,600,600,600".to_string());
    runtime.tick(t1 + Duration::from_millis(100), &mut consumer);
    let t2 = t1 + Duration::from_secs(2);
    runtime.tick(t2, &mut consumer);
    queue.push("0.1,0.2,0.3,1.0,2.0,3.0,400,400,400,400,400".to_string());
    runtime.tick(t2 + Duration::from_millis(100), &mut consumer);
    let t3 = t2 + Duration::from_secs(2);
    runtime.tick(t3, &mut consumer);
    assert!(runtime.is_calibrated());

    queue.push("0.1,0.2,0.3,1.0,2.0,3.0,500,500,500,500,500".to_string());
    runtime.tick(t3 + Duration::from_millis(200), &mut consumer);
    assert_eq!(consumer.gestures, vec!["half"]);
}

#[test]
fn test_orientation_template_never_matches_inertial_stream() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path().join("states.json"));
    store
        .append(GestureTemplate {
            name: "pointing-up".to_string(),
            orientation: [1.0, 0.0, 0.0, 0.0],
            fingers: [0.0; 5],
            includes_orientation: true,
            includes_fingers: false,
            orientation_mask: mask::ALL,
        })
        .unwrap();

    let queue = Arc::new(SegQueue::new());
    let mut runtime = GloveRuntime::new(&fast_config(), Arc::clone(&queue), store);
    let mut consumer = Recorder::default();

    let t0 = Instant::now();
    runtime.start_calibration(t0);
    let t1 = t0 + Duration::from_secs(2);
    runtime.tick(t1, &mut consumer);
    queue.push("0,0,0,0,0,0,600,600,600,600,600".to_string());
    runtime.tick(t1 + Duration::from_millis(100), &mut consumer);
    let t2 = t1 + Duration::from_secs(2);
    runtime.tick(t2, &mut consumer);
    queue.push("0,0,0,0,0,0,400,400,400,400,400".to_string());
    runtime.tick(t2 + Duration::from_millis(100), &mut consumer);
    let t3 = t2 + Duration::from_secs(2);
    runtime.tick(t3, &mut consumer);

    queue.push("0,0,0,0,0,0,500,500,500,500,500".to_string());
    runtime.tick(t3 + Duration::from_millis(200), &mut consumer);

    // No quaternion ever arrived, so an orientation template cannot match
    assert!(consumer.gestures.is_empty());
    assert!(consumer.no_matches >= 1);
}

#[test]
fn test_capture_then_reclassify_own_pose() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("states.json");
    let queue = Arc::new(SegQueue::new());
    let store = TemplateStore::empty(&path);

    let mut runtime = GloveRuntime::new(&fast_config(), Arc::clone(&queue), store);
    let mut consumer = Recorder::default();
    let t = calibrate(&mut runtime, &queue, &mut consumer, Instant::now());

    runtime
        .begin_capture(
            glove_core::gesture::capture::CaptureRequest {
                name: "held-pose".to_string(),
                include_orientation: false,
                include_fingers: true,
                orientation_mask: mask::ALL,
            },
            t,
        )
        .unwrap();

    queue.push("1,0,0,0,500,500,500,500,500".to_string());
    runtime.tick(t + Duration::from_millis(100), &mut consumer);

    // Window closes; the averaged template lands in the store
    runtime.tick(t + Duration::from_secs(6), &mut consumer);
    assert_eq!(runtime.store().len(), 1);

    // The same pose now classifies against the captured template
    queue.push("1,0,0,0,500,500,500,500,500".to_string());
    runtime.tick(t + Duration::from_secs(7), &mut consumer);
    assert_eq!(consumer.gestures.last().map(String::as_str), Some("held-pose"));

    // And it survived to disk
    let reloaded = TemplateStore::load(&path).unwrap();
    assert_eq!(reloaded.templates()[0].name, "held-pose");
}
