//! Synth controls: scalar parameters shared between the control thread and the audio thread.
//!
//! Each field is an independent atomic. The audio thread may see one field
//! updated a buffer before another; no field depends on another being current.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use super::Waveform;

/// Largest volume that keeps samples inside the 16-bit range.
pub const MAX_VOLUME: f64 = i16::MAX as f64;

/// An `f64` stored as its bit pattern in an `AtomicU64`.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Immutable copy of the controls, taken once per audio buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    pub frequency: f64,
    pub volume: f64,
    pub audible: bool,
    pub waveform: Waveform,
}

impl ControlSnapshot {
    /// Volume actually applied to samples: zero while the gate is closed.
    pub fn effective_volume(&self) -> f64 {
        if self.audible {
            self.volume
        } else {
            0.0
        }
    }
}

/// Lock-free parameter block written by the control thread, read by the audio thread.
#[derive(Debug)]
pub struct SynthControls {
    frequency: AtomicF64,
    volume: AtomicF64,
    audible: AtomicBool,
    waveform: AtomicU8,
}

impl SynthControls {
    pub fn new(frequency: f64, volume: f64, audible: bool, waveform: Waveform) -> Self {
        Self {
            frequency: AtomicF64::new(frequency),
            volume: AtomicF64::new(volume),
            audible: AtomicBool::new(audible),
            waveform: AtomicU8::new(waveform.index()),
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency.load()
    }

    pub fn set_frequency(&self, frequency: f64) {
        self.frequency.store(frequency);
    }

    pub fn volume(&self) -> f64 {
        self.volume.load()
    }

    /// Volume is a linear sample scale in `0..=MAX_VOLUME`; the caller keeps it in range.
    pub fn set_volume(&self, volume: f64) {
        self.volume.store(volume);
    }

    pub fn audible(&self) -> bool {
        self.audible.load(Ordering::Relaxed)
    }

    pub fn set_audible(&self, audible: bool) {
        self.audible.store(audible, Ordering::Relaxed);
    }

    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed))
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform.index(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            frequency: self.frequency(),
            volume: self.volume(),
            audible: self.audible(),
            waveform: self.waveform(),
        }
    }
}

impl Default for SynthControls {
    /// A4 sine at full volume, gate closed.
    fn default() -> Self {
        Self::new(440.0, MAX_VOLUME, false, Waveform::Sine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn defaults() {
        let controls = SynthControls::default();
        let snap = controls.snapshot();
        assert_eq!(snap.frequency, 440.0);
        assert_eq!(snap.volume, MAX_VOLUME);
        assert!(!snap.audible);
        assert_eq!(snap.waveform, Waveform::Sine);
        assert_eq!(snap.effective_volume(), 0.0);
    }

    #[test]
    fn setters_round_trip() {
        let controls = SynthControls::default();
        controls.set_frequency(123.456);
        controls.set_volume(1000.5);
        controls.set_audible(true);
        controls.set_waveform(Waveform::Triangle);
        let snap = controls.snapshot();
        assert_eq!(snap.frequency, 123.456);
        assert_eq!(snap.volume, 1000.5);
        assert!(snap.audible);
        assert_eq!(snap.waveform, Waveform::Triangle);
        assert_eq!(snap.effective_volume(), 1000.5);
    }

    #[test]
    fn visible_across_threads() {
        let controls = Arc::new(SynthControls::default());
        let writer = controls.clone();
        thread::spawn(move || {
            writer.set_frequency(880.0);
            writer.set_waveform(Waveform::Square);
        })
        .join()
        .unwrap();
        assert_eq!(controls.frequency(), 880.0);
        assert_eq!(controls.waveform(), Waveform::Square);
    }
}
