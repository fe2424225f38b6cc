//! Note numbers: equal-temperament tuning and note names.
//!
//! Note numbers count semitones from A0 = 1, so C1 = 4 and A4 = 49 = 440 Hz.

use super::{PitchClass, BASE_OFFSET, SEMITONES};

/// Note number tuned to [`REFERENCE_FREQUENCY`].
pub const REFERENCE_NOTE: i32 = 49;

/// Concert A in Hz.
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Convert a note number to its frequency in Hz.
pub fn note_to_frequency(note: i32) -> f64 {
    REFERENCE_FREQUENCY * 2.0f64.powf((note - REFERENCE_NOTE) as f64 / SEMITONES as f64)
}

/// Nearest note number for a frequency in Hz. Inverse of [`note_to_frequency`].
pub fn frequency_to_note(frequency: f64) -> i32 {
    let semitones = SEMITONES as f64 * (frequency / REFERENCE_FREQUENCY).log2();
    REFERENCE_NOTE + semitones.round() as i32
}

/// Render a note number as pitch class and octave, e.g. 40 → "C4", 49 → "A4".
pub fn note_name(note: i32) -> String {
    let from_c1 = note - BASE_OFFSET;
    let pitch_class = PitchClass::from_index(from_c1);
    let octave = from_c1.div_euclid(SEMITONES) + 1;
    format!("{pitch_class}{octave}")
}
