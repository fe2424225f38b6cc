//! Scales: pitch classes, interval presets, and scale generation.
//!
//! A [`Scale`] is a flat, precomputed list of absolute note numbers built from a
//! [`ScaleSpec`]. It is regenerated in full whenever the spec changes and is
//! never edited in place, so the angle-to-note lookup stays a plain index.

pub mod note;
pub mod quantize;

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use note::{frequency_to_note, note_name, note_to_frequency};
pub use quantize::{quantize, quantize_index};

/// Note number of the lowest C (octave 1). Note 1 is A0.
pub const BASE_OFFSET: i32 = 4;

/// Semitones per octave.
pub const SEMITONES: i32 = 12;

/// The twelve pitch classes a scale can be built from, in chromatic order from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Fs,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl PitchClass {
    pub fn all() -> &'static [PitchClass] {
        &[
            PitchClass::C,
            PitchClass::Db,
            PitchClass::D,
            PitchClass::Eb,
            PitchClass::E,
            PitchClass::F,
            PitchClass::Fs,
            PitchClass::G,
            PitchClass::Ab,
            PitchClass::A,
            PitchClass::Bb,
            PitchClass::B,
        ]
    }

    /// Semitone offset above C (0..12).
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Pitch class for a semitone offset above C. Wraps outside 0..12.
    pub fn from_index(index: i32) -> Self {
        Self::all()[index.rem_euclid(SEMITONES) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Db => "D♭",
            PitchClass::D => "D",
            PitchClass::Eb => "E♭",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F♯",
            PitchClass::G => "G",
            PitchClass::Ab => "A♭",
            PitchClass::A => "A",
            PitchClass::Bb => "B♭",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = String;

    /// Accepts "C", "Db", "D♭", "C#", "F♯" and lowercase letters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let letter = chars
            .next()
            .ok_or_else(|| "empty pitch class".to_string())?;
        let base = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(format!("unknown pitch class '{s}'")),
        };
        let accidental = match chars.as_str() {
            "" => 0,
            "#" | "♯" | "s" => 1,
            "b" | "♭" => -1,
            _ => return Err(format!("unknown pitch class '{s}'")),
        };
        Ok(Self::from_index(base + accidental))
    }
}

/// Named scale shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleType {
    MajorPentatonic,
    Major,
    MinorPentatonic,
    NaturalMinor,
    HarmonicMinor,
    Chromatic,
    Blues,
}

impl ScaleType {
    pub fn all() -> &'static [ScaleType] {
        &[
            ScaleType::MajorPentatonic,
            ScaleType::Major,
            ScaleType::MinorPentatonic,
            ScaleType::NaturalMinor,
            ScaleType::HarmonicMinor,
            ScaleType::Chromatic,
            ScaleType::Blues,
        ]
    }

    /// Semitone offsets from the tonic, ascending, starting at 0.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ScaleType::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::MinorPentatonic => &[0, 4, 5, 7, 11],
            ScaleType::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleType::MajorPentatonic => "Major Pentatonic",
            ScaleType::Major => "Major",
            ScaleType::MinorPentatonic => "Minor Pentatonic",
            ScaleType::NaturalMinor => "Natural Minor",
            ScaleType::HarmonicMinor => "Harmonic Minor",
            ScaleType::Chromatic => "Chromatic",
            ScaleType::Blues => "Blues",
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleType {
    type Err = String;

    /// Matches display names or identifiers, ignoring case, spaces, `-` and `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::all()
            .iter()
            .copied()
            .find(|t| {
                let name: String = t
                    .name()
                    .chars()
                    .filter(|c| *c != ' ')
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == wanted
            })
            .ok_or_else(|| format!("unknown scale type '{s}'"))
    }
}

/// Ordered semitone offsets defining a scale's shape.
///
/// Never empty and always starts with 0, so the tonic is part of every scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSet(Vec<i32>);

impl IntervalSet {
    /// Build a custom interval set.
    ///
    /// # Panics
    ///
    /// Panics if `intervals` is empty or does not start with 0.
    pub fn new(intervals: Vec<i32>) -> Self {
        match Self::check(&intervals) {
            Ok(()) => Self(intervals),
            Err(reason) => panic!("invalid interval set {intervals:?}: {reason}"),
        }
    }

    /// Validate without panicking, for intervals coming from user configuration.
    pub fn try_new(intervals: Vec<i32>) -> Result<Self, String> {
        Self::check(&intervals)?;
        Ok(Self(intervals))
    }

    fn check(intervals: &[i32]) -> Result<(), String> {
        match intervals.first() {
            None => Err("interval set is empty".to_string()),
            Some(&first) if first != 0 => {
                Err(format!("first interval must be 0, got {first}"))
            }
            Some(_) => Ok(()),
        }
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ScaleType> for IntervalSet {
    fn from(scale_type: ScaleType) -> Self {
        Self(scale_type.intervals().to_vec())
    }
}

/// Everything needed to generate a [`Scale`].
///
/// Octaves are user-facing (1-based): octave 1 starts at note [`BASE_OFFSET`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleSpec {
    pub tonic: PitchClass,
    pub intervals: IntervalSet,
    pub min_octave: i32,
    pub max_octave: i32,
}

impl ScaleSpec {
    pub fn new(
        tonic: PitchClass,
        intervals: impl Into<IntervalSet>,
        min_octave: i32,
        max_octave: i32,
    ) -> Self {
        Self {
            tonic,
            intervals: intervals.into(),
            min_octave,
            max_octave,
        }
    }
}

impl Default for ScaleSpec {
    fn default() -> Self {
        Self::new(PitchClass::C, ScaleType::MajorPentatonic, 4, 6)
    }
}

/// Absolute note number for a zero-based octave index, tonic and interval.
fn note_at(octave_index: i32, tonic: PitchClass, interval: i32) -> i32 {
    BASE_OFFSET + octave_index * SEMITONES + tonic.index() + interval
}

/// A generated scale: ascending note numbers covering the octave range,
/// closed by the tonic of the top octave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    notes: Vec<i32>,
}

impl Scale {
    /// Generate the scale for `spec`.
    ///
    /// Every interval is laid out for octaves `min_octave..max_octave`, then the
    /// tonic of `max_octave` is appended once. When `max_octave < min_octave`
    /// only that closing tonic is produced.
    pub fn generate(spec: &ScaleSpec) -> Self {
        let octaves = (spec.max_octave - spec.min_octave).max(0) as usize;
        let mut notes = Vec::with_capacity(octaves * spec.intervals.len() + 1);

        for octave_index in (spec.min_octave - 1)..(spec.max_octave - 1) {
            for &interval in spec.intervals.as_slice() {
                notes.push(note_at(octave_index, spec.tonic, interval));
            }
        }
        notes.push(note_at(spec.max_octave - 1, spec.tonic, 0));

        Self { notes }
    }

    pub fn notes(&self) -> &[i32] {
        &self.notes
    }

    /// Number of notes. Always at least 1.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always false: a generated scale holds at least the closing tonic.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<i32> {
        self.notes.get(index).copied()
    }

    /// Half-open angular range `[start, end)` in radians covered by slot `index`
    /// on the scale wheel. Uses the same partition as [`quantize`].
    pub fn slice_of(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.notes.len() {
            return None;
        }
        let width = TAU / self.notes.len() as f64;
        Some((index as f64 * width, (index + 1) as f64 * width))
    }
}
