//! Stream callback: runs on the cpal audio thread.
//!
//! Adapts the i16 fill function to whatever sample format the device wants.
//! Float devices are served through a fixed scratch buffer so the callback
//! never allocates.

use cpal::Sample;

use super::FillFn;

/// Scratch size in samples for format conversion. Larger device buffers are
/// filled in several passes.
const SCRATCH_SAMPLES: usize = 4096;

/// State that lives on the audio thread. Accessed only from the cpal callback.
pub struct StreamCallback {
    fill: FillFn,
    scratch: Vec<i16>,
}

impl StreamCallback {
    pub fn new(fill: FillFn) -> Self {
        Self {
            fill,
            scratch: vec![0; SCRATCH_SAMPLES],
        }
    }

    /// Device takes i16 directly.
    pub fn process_i16(&mut self, output: &mut [i16]) {
        (self.fill)(output);
    }

    /// Device takes f32: render into scratch and convert.
    pub fn process_f32(&mut self, output: &mut [f32]) {
        for chunk in output.chunks_mut(SCRATCH_SAMPLES) {
            let scratch = &mut self.scratch[..chunk.len()];
            (self.fill)(scratch);
            for (out, &sample) in chunk.iter_mut().zip(scratch.iter()) {
                *out = sample.to_sample::<f32>();
            }
        }
    }
}
