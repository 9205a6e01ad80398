// src/utils/angles.rs
//! Display-angle conversion
//!
//! Turns finger openness percentages into joint angles for the operator
//! display, scaled by each finger's configured maximum range of motion.
//! Informational only; classification works on percentages.

use crate::frame::FLEX_CHANNELS;

/// Convert openness percentages (0..100) to display angles in degrees.
pub fn finger_angles(
    fingers: &[f32; FLEX_CHANNELS],
    rom_degrees: &[f32; FLEX_CHANNELS],
) -> [f32; FLEX_CHANNELS] {
    std::array::from_fn(|i| fingers[i] / 100.0 * rom_degrees[i])
}
