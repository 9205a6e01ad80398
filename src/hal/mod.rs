// src/hal/mod.rs
//! Hardware abstraction layer for the glove serial link

pub mod line_source;
pub mod serial_link;

pub use line_source::{LineSource, ScriptedLineSource, SerialError, SerialPortSource};
pub use serial_link::{LinkStats, SerialLinkConfig, SerialLinkReader};
