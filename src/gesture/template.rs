// src/gesture/template.rs
//! Named reference hand states

use crate::frame::FLEX_CHANNELS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Orientation mask bits, gating which quaternion components participate in
/// matching. Bit `i` gates component `i` in (w, x, y, z) order.
pub mod mask {
    pub const QW: u8 = 1 << 0;
    pub const QX: u8 = 1 << 1;
    pub const QY: u8 = 1 << 2;
    pub const QZ: u8 = 1 << 3;
    pub const ALL: u8 = QW | QX | QY | QZ;

    pub fn includes(mask: u8, component: usize) -> bool {
        mask & (1 << component) != 0
    }
}

/// One reference hand state: a subset of quaternion components plus finger
/// openness percentages, each side independently includable.
///
/// Immutable after creation; the capture routine builds these from a timed
/// averaging window and the store persists them in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureTemplate {
    pub name: String,
    /// Reference quaternion components (w, x, y, z); zero where masked out.
    #[serde(default)]
    pub orientation: [f32; 4],
    /// Reference finger openness percentages.
    #[serde(default)]
    pub fingers: [f32; FLEX_CHANNELS],
    pub includes_orientation: bool,
    pub includes_fingers: bool,
    #[serde(default = "default_mask")]
    pub orientation_mask: u8,
}

fn default_mask() -> u8 {
    mask::ALL
}

/// Template validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    EmptyName,
    /// Neither orientation nor fingers are included.
    NoComponents,
    /// Orientation is included but every component is masked out.
    EmptyMask,
    /// Mask has bits beyond the four quaternion components.
    InvalidMask(u8),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::EmptyName => write!(f, "template name cannot be empty"),
            TemplateError::NoComponents => {
                write!(f, "template must include orientation or fingers")
            }
            TemplateError::EmptyMask => {
                write!(f, "orientation is included but the mask selects no components")
            }
            TemplateError::InvalidMask(m) => write!(f, "invalid orientation mask: {:#06b}", m),
        }
    }
}

impl Error for TemplateError {}

impl GestureTemplate {
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if !self.includes_orientation && !self.includes_fingers {
            return Err(TemplateError::NoComponents);
        }
        if self.orientation_mask & !mask::ALL != 0 {
            return Err(TemplateError::InvalidMask(self.orientation_mask));
        }
        if self.includes_orientation && self.orientation_mask & mask::ALL == 0 {
            return Err(TemplateError::EmptyMask);
        }
        Ok(())
    }
}
