//! Tone synthesis: a single phase-continuous oscillator rendered as 16-bit stereo PCM.
//!
//! The [`ToneSynthesizer`] lives on the audio thread and owns the oscillator
//! phase. It reads [`SynthControls`] once per buffer and never allocates,
//! locks or blocks while rendering.

pub mod controls;
pub mod waveform;

use std::f64::consts::TAU;
use std::sync::Arc;

pub use controls::{ControlSnapshot, SynthControls, MAX_VOLUME};
pub use waveform::Waveform;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Interleaved output channels. The mono tone is duplicated to each.
pub const CHANNELS: usize = 2;

/// Oscillator state owned by the audio callback.
pub struct ToneSynthesizer {
    controls: Arc<SynthControls>,
    sample_rate: u32,
    /// Unbounded phase accumulator in radians. Never reset.
    phase: f64,
    current: ControlSnapshot,
}

impl ToneSynthesizer {
    pub fn new(controls: Arc<SynthControls>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0);
        let current = controls.snapshot();
        Self {
            controls,
            sample_rate: sample_rate.max(1),
            phase: 0.0,
            current,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current phase accumulator in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Controls as seen at the start of the most recent buffer.
    pub fn current(&self) -> ControlSnapshot {
        self.current
    }

    /// Render up to `frame_count` frames of interleaved stereo into `buffer`.
    ///
    /// Frames beyond `buffer.len() / CHANNELS` are not written. Returns the
    /// number of frames rendered.
    pub fn render(&mut self, buffer: &mut [i16], frame_count: usize) -> usize {
        self.current = self.controls.snapshot();
        let volume = self.current.effective_volume();
        let waveform = self.current.waveform;
        let step = TAU * self.current.frequency / self.sample_rate as f64;

        let frames = frame_count.min(buffer.len() / CHANNELS);
        for frame in buffer[..frames * CHANNELS].chunks_exact_mut(CHANNELS) {
            let sample = (volume * waveform.sample(self.phase)).round() as i16;
            frame.fill(sample);
            self.phase += step;
        }
        frames
    }

    /// Render as many whole frames as fit in `buffer`.
    pub fn fill(&mut self, buffer: &mut [i16]) -> usize {
        self.render(buffer, buffer.len() / CHANNELS)
    }
}
