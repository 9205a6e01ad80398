// src/bin/glove_monitor.rs
//! Command-line glove monitor
//!
//! Opens the configured serial port, runs a full calibration, then prints
//! classified gestures as the operator's hand moves. Intended for bring-up
//! and template debugging rather than end users.

use glove_core::config::GloveConfig;
use glove_core::gesture::store::TemplateStore;
use glove_core::hal::{SerialLinkReader, SerialPortSource};
use glove_core::runtime::{GestureConsumer, GloveRuntime};
use glove_core::utils::angles::finger_angles;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Prints gesture transitions, suppressing repeats of the same match.
struct StdoutConsumer {
    current: Option<String>,
}

impl GestureConsumer for StdoutConsumer {
    fn on_gesture(&mut self, name: &str) {
        if self.current.as_deref() != Some(name) {
            println!("gesture: {}", name);
            self.current = Some(name.to_string());
        }
    }

    fn on_no_match(&mut self) {
        if self.current.take().is_some() {
            println!("gesture: (none)");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("glove_core=info".parse()?))
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "glove.toml".to_string());
    let config = GloveConfig::load(&config_path)?;
    tracing::info!(config = %config_path, port = %config.serial.port_name, "starting glove monitor");

    let store = TemplateStore::load(&config.store.path)?;
    println!(
        "{} templates loaded from {}",
        store.len(),
        store.path().display()
    );

    let mut reader = SerialLinkReader::new();
    reader.start(Box::new(SerialPortSource::open(&config.serial)?))?;

    let rom_degrees = config.display.finger_rom_degrees;
    let mut runtime = GloveRuntime::new(&config, reader.queue(), store);
    let mut consumer = StdoutConsumer { current: None };

    println!(
        "calibrating: hold a fist after the {:.0}s warmup, then open your hand",
        config.calibration.warmup_secs
    );
    runtime.start_calibration(Instant::now());

    let mut was_calibrated = false;
    loop {
        runtime.tick(Instant::now(), &mut consumer);

        if runtime.is_calibrated() && !was_calibrated {
            was_calibrated = true;
            let summary = runtime.calibration_summary();
            if summary.degraded {
                println!("calibration completed with empty windows; consider re-running");
            } else {
                println!("calibration complete");
            }
            for (name, degenerate) in glove_core::frame::FINGER_NAMES
                .iter()
                .zip(summary.degenerate)
            {
                if degenerate {
                    println!("warning: {} has no usable range and will read 0", name);
                }
            }
            if let Some(frame) = runtime.current_frame() {
                let angles = finger_angles(&frame.fingers, &rom_degrees);
                tracing::debug!(?angles, "initial finger angles");
            }
        }

        if let Some(err) = runtime.take_last_error() {
            eprintln!("pipeline error: {}", err);
        }

        std::thread::sleep(TICK_INTERVAL);
    }
}
