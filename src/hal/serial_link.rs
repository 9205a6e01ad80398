// src/hal/serial_link.rs
//! Background serial link reader
//!
//! One dedicated thread owns the line source and pushes complete frames into
//! a shared lock-free queue. The game-logic domain is the sole consumer and
//! drains the queue once per tick; the reader never blocks on it. The queue
//! is unbounded by design: the stream is a single low-rate sensor and the
//! consumer drains to empty every tick.
//!
//! A device read failure is fatal to the reader thread only: it reports once
//! and exits, and the consumer continues over an empty queue.

use crate::hal::line_source::{LineSource, SerialError};
use crossbeam::queue::SegQueue;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serial link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialLinkConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u32,
}

impl Default for SerialLinkConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 50,
        }
    }
}

impl SerialLinkConfig {
    pub fn validate(&self) -> Result<(), SerialError> {
        if self.port_name.is_empty() {
            return Err(SerialError::InvalidConfig("port name cannot be empty".to_string()));
        }

        if self.baud_rate == 0 || self.baud_rate > 4_000_000 {
            return Err(SerialError::InvalidConfig(format!(
                "invalid baud rate: {}",
                self.baud_rate
            )));
        }

        if self.read_timeout_ms == 0 || self.read_timeout_ms > 60_000 {
            return Err(SerialError::InvalidConfig(format!(
                "invalid read timeout: {} ms",
                self.read_timeout_ms
            )));
        }

        Ok(())
    }
}

/// Reader-side counters, shared with the consumer for status polling.
#[derive(Debug, Default)]
pub struct LinkStats {
    lines_received: AtomicU64,
    read_errors: AtomicU64,
}

impl LinkStats {
    pub fn lines_received(&self) -> u64 {
        self.lines_received.load(Ordering::Relaxed)
    }

    pub fn read_errors(&self) -> u64 {
        self.read_errors.load(Ordering::Relaxed)
    }
}

/// Owns the reader thread and the shared line queue.
///
/// Strict SPSC discipline: the thread is the only producer, the runtime tick
/// the only consumer. `stop` signals the thread, joins it, and drops the
/// source, which closes the device.
pub struct SerialLinkReader {
    queue: Arc<SegQueue<String>>,
    running: Arc<AtomicBool>,
    stats: Arc<LinkStats>,
    handle: Option<JoinHandle<()>>,
}

impl SerialLinkReader {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(LinkStats::default()),
            handle: None,
        }
    }

    /// Spawn the reader thread over `source`. Fails if already started.
    pub fn start(&mut self, mut source: Box<dyn LineSource>) -> Result<(), SerialError> {
        if self.handle.is_some() {
            return Err(SerialError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let queue = Arc::clone(&self.queue);
        let running = Arc::clone(&self.running);
        let stats = Arc::clone(&self.stats);

        let handle = thread::Builder::new()
            .name("glove-serial-reader".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    match source.read_line() {
                        Ok(Some(line)) => {
                            queue.push(line);
                            stats.lines_received.fetch_add(1, Ordering::Relaxed);
                        }
                        Ok(None) => {
                            // No complete frame yet. A real port already
                            // blocked for its timeout; keep scripted sources
                            // from spinning.
                            thread::sleep(Duration::from_millis(1));
                        }
                        Err(e) => {
                            // Fatal to the reader only: report once and quit.
                            // The consumer keeps ticking over an empty queue.
                            stats.read_errors.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(error = %e, "serial read failed, reader stopped");
                            break;
                        }
                    }
                }
            })
            .map_err(|e| SerialError::ReadFailed(format!("failed to spawn reader thread: {}", e)))?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Signal the thread to stop and join it. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::debug!("serial reader thread joined");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Consumer-side handle to the shared line queue.
    pub fn queue(&self) -> Arc<SegQueue<String>> {
        Arc::clone(&self.queue)
    }

    pub fn stats(&self) -> Arc<LinkStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for SerialLinkReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SerialLinkReader {
    fn drop(&mut self) {
        self.stop();
    }
}
