//! Audio output: the boundary between the synthesizer and whatever plays its samples.
//!
//! An [`AudioOutput`] accepts a buffer-fill function and calls it at its own
//! cadence with interleaved 16-bit stereo buffers. [`AudioEngine`] drives it
//! from a cpal output stream; [`WavRecorder`] drives it offline into a file.

pub mod callback;
pub mod wav;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

pub use callback::StreamCallback;
pub use wav::WavRecorder;

use crate::synth::CHANNELS;

/// A buffer-fill function: render interleaved stereo i16 frames into the slice.
pub type FillFn = Box<dyn FnMut(&mut [i16]) + Send + 'static>;

/// Audio output errors.
#[derive(Debug)]
pub enum AudioError {
    /// No audio output device found.
    NoOutputDevice,
    /// Failed to query device configuration.
    DeviceConfig(String),
    /// Failed to build the audio stream.
    StreamBuild(String),
    /// Failed to start or pause the audio stream.
    StreamPlay(String),
    /// The output was already started.
    AlreadyStarted,
    /// Writing the WAV file failed.
    Wav(String),
    /// A render length that is negative or not finite.
    InvalidDuration(f64),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoOutputDevice => write!(f, "no audio output device found"),
            AudioError::DeviceConfig(e) => write!(f, "device config error: {e}"),
            AudioError::StreamBuild(e) => write!(f, "stream build error: {e}"),
            AudioError::StreamPlay(e) => write!(f, "stream play error: {e}"),
            AudioError::AlreadyStarted => write!(f, "audio output already started"),
            AudioError::Wav(e) => write!(f, "wav error: {e}"),
            AudioError::InvalidDuration(s) => write!(f, "invalid render length: {s} s"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Something that consumes audio by repeatedly invoking a fill function.
pub trait AudioOutput {
    /// Frames per second the fill function is expected to produce.
    fn sample_rate(&self) -> u32;

    /// Hand over the fill function and begin pulling audio.
    ///
    /// Real-time outputs return immediately and call `fill` from their own
    /// thread; offline outputs may run to completion before returning.
    fn start(&mut self, fill: FillFn) -> Result<(), AudioError>;
}

/// Live output through the default cpal device.
pub struct AudioEngine {
    device: cpal::Device,
    sample_format: cpal::SampleFormat,
    sample_rate: u32,
    stream: Option<cpal::Stream>,
}

impl AudioEngine {
    /// Open the default output device at `sample_rate`, stereo.
    pub fn new(sample_rate: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        log::info!(
            "audio device '{name}' (default {} Hz, {:?})",
            default_config.sample_rate().0,
            default_config.sample_format()
        );

        Ok(Self {
            device,
            sample_format: default_config.sample_format(),
            sample_rate,
            stream: None,
        })
    }

    fn stream_config(&self) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: CHANNELS as u16,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        }
    }

    /// Pause the audio stream.
    pub fn pause(&self) -> Result<(), AudioError> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| AudioError::StreamPlay(e.to_string()))?;
        }
        Ok(())
    }

    /// Resume the audio stream.
    pub fn play(&self) -> Result<(), AudioError> {
        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| AudioError::StreamPlay(e.to_string()))?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

impl AudioOutput for AudioEngine {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, fill: FillFn) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Err(AudioError::AlreadyStarted);
        }

        let config = self.stream_config();
        let err_fn = |err: cpal::StreamError| {
            log::error!("audio stream error: {err}");
        };

        let mut callback = StreamCallback::new(fill);
        let stream = match self.sample_format {
            cpal::SampleFormat::I16 => self.device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    callback.process_i16(data);
                },
                err_fn,
                None,
            ),
            _ => self.device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback.process_f32(data);
                },
                err_fn,
                None,
            ),
        }
        .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        log::info!(
            "audio stream running: {} Hz, {} ch, {:?}",
            self.sample_rate,
            CHANNELS,
            self.sample_format
        );
        self.stream = Some(stream);
        Ok(())
    }
}
