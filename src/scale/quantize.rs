//! Pitch quantization: maps a wheel angle onto a slot of a generated scale.

use std::f64::consts::TAU;

use super::Scale;

/// Slot index for `angle` (radians, expected in `[0, 2π)`) on a wheel of `len` slots.
///
/// Slot boundaries belong to the lower slot. Out-of-range angles clamp to the
/// first or last slot; `len` of 0 is treated as 1.
pub fn quantize_index(angle: f64, len: usize) -> usize {
    let len = len.max(1);
    let fraction = angle / TAU;
    let slot = (fraction * len as f64).floor();
    if slot.is_nan() || slot < 0.0 {
        0
    } else {
        (slot as usize).min(len - 1)
    }
}

/// Note number at `angle` on the scale wheel. O(1) lookup into the precomputed scale.
pub fn quantize(angle: f64, scale: &Scale) -> i32 {
    let index = quantize_index(angle, scale.len());
    scale.notes()[index]
}
