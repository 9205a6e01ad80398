// src/hal/line_source.rs
//! Line-oriented sources for the serial link reader
//!
//! The reader thread is written against the [`LineSource`] trait so the real
//! serial port and a scripted replacement are interchangeable. Tests and
//! demos use [`ScriptedLineSource`]; production uses [`SerialPortSource`].

use crate::hal::serial_link::SerialLinkConfig;
use std::error::Error;
use std::fmt;
use std::io::Read;
use std::time::Duration;

/// Serial device errors
#[derive(Debug, Clone)]
pub enum SerialError {
    OpenFailed { port: String, reason: String },
    ReadFailed(String),
    InvalidConfig(String),
    AlreadyRunning,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialError::OpenFailed { port, reason } => {
                write!(f, "failed to open serial port {}: {}", port, reason)
            }
            SerialError::ReadFailed(msg) => write!(f, "serial read failed: {}", msg),
            SerialError::InvalidConfig(msg) => write!(f, "invalid serial configuration: {}", msg),
            SerialError::AlreadyRunning => write!(f, "serial link reader is already running"),
        }
    }
}

impl Error for SerialError {}

/// A blocking-with-timeout producer of newline-terminated frames.
///
/// `read_line` returns `Ok(None)` when no complete line is available yet
/// (timeout expired mid-frame, or the source is exhausted). Implementations
/// must be `Send`; the reader thread takes ownership of the source.
pub trait LineSource: Send {
    fn read_line(&mut self) -> Result<Option<String>, SerialError>;
}

/// Real serial device source.
///
/// Accumulates raw bytes into an internal buffer and hands out one complete
/// line at a time. Read timeouts are normal flow control, not errors.
pub struct SerialPortSource {
    port: Box<dyn serialport::SerialPort>,
    pending: Vec<u8>,
}

impl SerialPortSource {
    /// Open the configured port. Failure is reported once; callers must not
    /// retry (a missing device is an operator problem, not a transient one).
    pub fn open(config: &SerialLinkConfig) -> Result<Self, SerialError> {
        config.validate()?;

        let port = serialport::new(&config.port_name, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms as u64))
            .open()
            .map_err(|e| SerialError::OpenFailed {
                port: config.port_name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(port = %config.port_name, baud = config.baud_rate, "serial port opened");

        Ok(Self {
            port,
            pending: Vec::with_capacity(256),
        })
    }

    fn take_pending_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop(); // newline
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl LineSource for SerialPortSource {
    fn read_line(&mut self) -> Result<Option<String>, SerialError> {
        if let Some(line) = self.take_pending_line() {
            return Ok(Some(line));
        }

        let mut buf = [0u8; 256];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.pending.extend_from_slice(&buf[..n]);
                Ok(self.take_pending_line())
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(SerialError::ReadFailed(e.to_string())),
        }
    }
}

impl Drop for SerialPortSource {
    fn drop(&mut self) {
        tracing::info!("serial port closed");
    }
}

/// Canned source replaying a fixed sequence of lines, then running dry.
#[derive(Debug, Default)]
pub struct ScriptedLineSource {
    lines: std::collections::VecDeque<String>,
    line_delay: Option<Duration>,
}

impl ScriptedLineSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            line_delay: None,
        }
    }

    /// Sleep this long before handing out each line, approximating a real
    /// device's sample rate in demos.
    pub fn with_line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = Some(delay);
        self
    }

    /// Queue another line behind the existing script.
    pub fn push_line<S: Into<String>>(&mut self, line: S) {
        self.lines.push_back(line.into());
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedLineSource {
    fn read_line(&mut self) -> Result<Option<String>, SerialError> {
        let line = self.lines.pop_front();
        if line.is_some() {
            if let Some(delay) = self.line_delay {
                std::thread::sleep(delay);
            }
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_replays_in_order() {
        let mut source = ScriptedLineSource::new(["a", "b"]);
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
        assert_eq!(source.read_line().unwrap(), Some("b".to_string()));
        assert_eq!(source.read_line().unwrap(), None);
    }

    #[test]
    fn test_scripted_source_push() {
        let mut source = ScriptedLineSource::default();
        source.push_line("x");
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.read_line().unwrap(), Some("x".to_string()));
    }
}
