//! Offline output: pulls a fixed number of frames and writes a 16-bit stereo WAV file.

use std::path::{Path, PathBuf};

use super::{AudioError, AudioOutput, FillFn};
use crate::synth::CHANNELS;

/// Default frames per fill call, comparable to a hardware buffer.
pub const DEFAULT_BLOCK_FRAMES: usize = 512;

/// Renders audio as fast as possible into a WAV file.
pub struct WavRecorder {
    path: PathBuf,
    sample_rate: u32,
    total_frames: u64,
    block_frames: usize,
    frames_written: u64,
}

impl WavRecorder {
    pub fn new(path: impl AsRef<Path>, sample_rate: u32, total_frames: u64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sample_rate,
            total_frames,
            block_frames: DEFAULT_BLOCK_FRAMES,
            frames_written: 0,
        }
    }

    /// Recorder for `seconds` of audio. Rejects negative and non-finite lengths.
    pub fn with_duration(
        path: impl AsRef<Path>,
        sample_rate: u32,
        seconds: f64,
    ) -> Result<Self, AudioError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(AudioError::InvalidDuration(seconds));
        }
        let total_frames = (seconds * sample_rate as f64).round() as u64;
        Ok(Self::new(path, sample_rate, total_frames))
    }

    /// Frames requested per fill call.
    pub fn with_block_frames(mut self, block_frames: usize) -> Self {
        self.block_frames = block_frames.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: CHANNELS as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl AudioOutput for WavRecorder {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Runs to completion: calls `fill` block by block until `total_frames` are written.
    fn start(&mut self, mut fill: FillFn) -> Result<(), AudioError> {
        let wav_err = |e: hound::Error| AudioError::Wav(e.to_string());
        let mut writer = hound::WavWriter::create(&self.path, self.spec()).map_err(wav_err)?;

        let mut block = vec![0i16; self.block_frames * CHANNELS];
        self.frames_written = 0;
        while self.frames_written < self.total_frames {
            let remaining = (self.total_frames - self.frames_written) as usize;
            let frames = remaining.min(self.block_frames);
            let samples = &mut block[..frames * CHANNELS];
            fill(samples);
            for &sample in samples.iter() {
                writer.write_sample(sample).map_err(wav_err)?;
            }
            self.frames_written += frames as u64;
        }

        writer.finalize().map_err(wav_err)?;
        log::info!(
            "wrote {} frames ({:.2}s) to {}",
            self.frames_written,
            self.frames_written as f64 / self.sample_rate as f64,
            self.path.display()
        );
        Ok(())
    }
}
