//! Shaker sounds: WAV loading to mono f32, plus a synthesized default.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Errors loading a shaker sound.
#[derive(Debug)]
pub enum SampleError {
    Io(std::io::Error),
    /// WAV decoding error.
    Wav(hound::Error),
    /// The file decoded to no frames.
    Empty,
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Io(e) => write!(f, "sample io error: {e}"),
            SampleError::Wav(e) => write!(f, "WAV error: {e}"),
            SampleError::Empty => write!(f, "WAV file contains no samples"),
        }
    }
}

impl std::error::Error for SampleError {}

impl From<hound::Error> for SampleError {
    fn from(e: hound::Error) -> Self {
        SampleError::Wav(e)
    }
}

impl From<std::io::Error> for SampleError {
    fn from(e: std::io::Error) -> Self {
        SampleError::Io(e)
    }
}

/// Length of the synthesized shaker burst.
const SYNTH_SECONDS: f64 = 0.12;

/// A mono one-shot at the output sample rate, values in `-1.0..=1.0`.
#[derive(Debug, Clone)]
pub struct ShakerSample {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl ShakerSample {
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Load a WAV file and convert it for playback at `sample_rate`.
    pub fn load(path: &Path, sample_rate: u32) -> Result<Self, SampleError> {
        let file = BufReader::new(File::open(path)?);
        let sample = Self::from_wav(file, sample_rate)?;
        log::info!(
            "loaded shaker sound {} ({} frames)",
            path.display(),
            sample.len()
        );
        Ok(sample)
    }

    /// Decode 16/24/32-bit integer or float WAV, mix to mono, and resample
    /// linearly if the file rate differs from `sample_rate`.
    pub fn from_wav<R: Read + Seek>(reader: R, sample_rate: u32) -> Result<Self, SampleError> {
        let wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let scale = (1u32 << (spec.bits_per_sample - 1)) as f32;
                wav.into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Float => wav.into_samples::<f32>().collect::<Result<_, _>>()?,
        };

        let mono: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        if mono.is_empty() {
            return Err(SampleError::Empty);
        }

        let samples = if spec.sample_rate == sample_rate {
            mono
        } else {
            resample(&mono, spec.sample_rate, sample_rate)
        };
        Ok(Self::from_mono(samples, sample_rate))
    }

    /// A short decaying noise burst, reproducible for a given seed.
    pub fn synthesized(sample_rate: u32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let rate = sample_rate.max(1) as f64;
        let len = (SYNTH_SECONDS * rate).round() as usize;
        let attack = (0.002 * rate).max(1.0);
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 / rate;
                let envelope = (i as f64 / attack).min(1.0) * (-t / 0.025).exp();
                (rng.gen_range(-1.0..=1.0) * 0.8 * envelope) as f32
            })
            .collect();
        Self::from_mono(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn resample(input: &[f32], from: u32, to: u32) -> Vec<f32> {
    let ratio = from as f64 / to.max(1) as f64;
    let len = (input.len() as f64 / ratio).ceil() as usize;
    (0..len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            match (input.get(idx), input.get(idx + 1)) {
                (Some(&a), Some(&b)) => a + (b - a) * frac,
                (Some(&a), None) => a,
                _ => 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn stereo_mixed_to_mono() {
        let bytes = wav_bytes(2, 44_100, &[16384, 0, -16384, -16384]);
        let sample = ShakerSample::from_wav(Cursor::new(bytes), 44_100).unwrap();
        assert_eq!(sample.samples(), &[0.25, -0.5]);
    }

    #[test]
    fn resampled_to_output_rate() {
        let bytes = wav_bytes(1, 22_050, &[0; 100]);
        let sample = ShakerSample::from_wav(Cursor::new(bytes), 44_100).unwrap();
        assert_eq!(sample.len(), 200);
        assert_eq!(sample.sample_rate(), 44_100);
    }

    #[test]
    fn empty_file_rejected() {
        let bytes = wav_bytes(1, 44_100, &[]);
        let err = ShakerSample::from_wav(Cursor::new(bytes), 44_100).unwrap_err();
        assert!(matches!(err, SampleError::Empty));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shake.wav");
        std::fs::write(&path, wav_bytes(1, 44_100, &[8192; 10])).unwrap();
        let sample = ShakerSample::load(&path, 44_100).unwrap();
        assert_eq!(sample.samples(), &[0.25; 10]);

        let missing = ShakerSample::load(&dir.path().join("none.wav"), 44_100);
        assert!(matches!(missing, Err(SampleError::Io(_))));
    }

    #[test]
    fn synthesized_burst_is_seeded_and_decays() {
        let a = ShakerSample::synthesized(44_100, 7);
        let b = ShakerSample::synthesized(44_100, 7);
        assert_eq!(a.samples(), b.samples());
        assert_eq!(a.len(), 5292);
        assert!(a.samples().iter().all(|s| s.abs() <= 0.8));

        let head: f32 = a.samples()[100..600].iter().map(|s| s.abs()).sum();
        let tail: f32 = a.samples()[4700..5200].iter().map(|s| s.abs()).sum();
        assert!(head > tail * 10.0);
    }
}
