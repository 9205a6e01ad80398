// src/frame.rs
//! Wire frame decoding for the glove's serial stream
//!
//! The glove firmware emits one comma-separated, newline-terminated line per
//! sample. Two firmware variants exist: a 9-field layout carrying an
//! orientation quaternion followed by the five flex readings, and an 11-field
//! layout carrying raw accelerometer/gyro values (no quaternion) with the
//! flex readings at offset 6. The parser keys on field count.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Number of flex-sensor channels (thumb, index, middle, ring, pinky).
pub const FLEX_CHANNELS: usize = 5;

/// Minimum field count for any valid frame.
pub const MIN_FIELDS: usize = 9;

/// Field count at which a line is interpreted as the inertial-raw variant.
const INERTIAL_FIELDS: usize = 11;

/// Flex offset in the quaternion variant (after qw,qx,qy,qz).
const QUATERNION_FLEX_OFFSET: usize = 4;

/// Flex offset in the inertial variant (after ax,ay,az,gx,gy,gz).
const INERTIAL_FLEX_OFFSET: usize = 6;

/// Human-readable finger names, indexed like the flex arrays.
pub const FINGER_NAMES: [&str; FLEX_CHANNELS] = ["thumb", "index", "middle", "ring", "pinky"];

/// Orientation quaternion in (w, x, y, z) component order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Identity rotation.
    pub const IDENTITY: Quaternion = Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Components in (w, x, y, z) order, matching the wire layout and the
    /// template orientation mask bit order.
    pub fn components(&self) -> [f32; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Largest absolute per-component difference against `other`.
    pub fn max_component_delta(&self, other: &Quaternion) -> f32 {
        let a = self.components();
        let b = other.components();
        let mut max = 0.0f32;
        for i in 0..4 {
            let delta = (a[i] - b[i]).abs();
            if delta > max {
                max = delta;
            }
        }
        max
    }
}

/// One decoded serial line.
///
/// `orientation` is `None` for the inertial firmware variant, which does not
/// report a quaternion. Constructed fresh per line; never retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub orientation: Option<Quaternion>,
    pub flex: [f32; FLEX_CHANNELS],
}

/// Calibrated view of one sample: filtered orientation plus finger openness
/// percentages in [0, 100], where 100 is fully open regardless of sensor
/// polarity. Derived fresh each tick; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFrame {
    pub orientation: Option<Quaternion>,
    pub fingers: [f32; FLEX_CHANNELS],
}

/// Frame decoding errors
#[derive(Debug, Clone, PartialEq)]
pub enum FrameParseError {
    TooFewFields { expected: usize, actual: usize },
    InvalidNumber { index: usize, value: String },
}

impl fmt::Display for FrameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameParseError::TooFewFields { expected, actual } => {
                write!(f, "frame has {} fields, expected at least {}", actual, expected)
            }
            FrameParseError::InvalidNumber { index, value } => {
                write!(f, "field {} is not numeric: {:?}", index, value)
            }
        }
    }
}

impl Error for FrameParseError {}

/// Decode one raw line into a [`RawSample`].
///
/// Extra trailing fields beyond the recognized layout are ignored. A
/// malformed line is rejected whole; no partial sample is ever produced.
pub fn parse_line(line: &str) -> Result<RawSample, FrameParseError> {
    let fields: Vec<&str> = line.trim().split(',').collect();

    if fields.len() < MIN_FIELDS {
        return Err(FrameParseError::TooFewFields {
            expected: MIN_FIELDS,
            actual: fields.len(),
        });
    }

    let (orientation, flex_offset) = if fields.len() >= INERTIAL_FIELDS {
        (None, INERTIAL_FLEX_OFFSET)
    } else {
        let q = Quaternion::new(
            parse_field(&fields, 0)?,
            parse_field(&fields, 1)?,
            parse_field(&fields, 2)?,
            parse_field(&fields, 3)?,
        );
        (Some(q), QUATERNION_FLEX_OFFSET)
    };

    let mut flex = [0.0f32; FLEX_CHANNELS];
    for (i, slot) in flex.iter_mut().enumerate() {
        *slot = parse_field(&fields, flex_offset + i)?;
    }

    Ok(RawSample { orientation, flex })
}

fn parse_field(fields: &[&str], index: usize) -> Result<f32, FrameParseError> {
    let raw = fields[index].trim();
    raw.parse::<f32>().map_err(|_| FrameParseError::InvalidNumber {
        index,
        value: raw.to_string(),
    })
}
