//! Audio-thread playback of shaker voices.
//!
//! The control thread bumps a pending-trigger counter; the player collects
//! the count at the top of each buffer and starts that many voices. Voices
//! overlap, so a quick second shake layers over the tail of the first.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::sample::ShakerSample;
use crate::synth::CHANNELS;

/// Voices that can sound at once. Past this the oldest voice is restarted.
pub const MAX_VOICES: usize = 8;

/// Control-thread handle that starts a voice per call.
#[derive(Debug, Clone)]
pub struct ShakeTrigger {
    pending: Arc<AtomicU32>,
}

impl ShakeTrigger {
    pub fn trigger(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Voice {
    position: usize,
    active: bool,
}

/// Mixes overlapping voices of one sample into interleaved stereo.
pub struct ShakerPlayer {
    sample: Vec<f32>,
    voices: [Voice; MAX_VOICES],
    pending: Arc<AtomicU32>,
    volume: f64,
}

/// Create a trigger/player pair around `sample` played at `volume` (0..=32767).
pub fn shaker_channel(sample: ShakerSample, volume: f64) -> (ShakeTrigger, ShakerPlayer) {
    let pending = Arc::new(AtomicU32::new(0));
    let trigger = ShakeTrigger {
        pending: pending.clone(),
    };
    let player = ShakerPlayer {
        sample: sample.samples().to_vec(),
        voices: [Voice::default(); MAX_VOICES],
        pending,
        volume,
    };
    (trigger, player)
}

impl ShakerPlayer {
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    fn start_voice(&mut self) {
        let slot = match self.voices.iter().position(|v| !v.active) {
            Some(free) => free,
            None => {
                log::debug!("all {MAX_VOICES} shaker voices busy, restarting the oldest");
                self.voices
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, v)| v.position)
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            }
        };
        self.voices[slot] = Voice {
            position: 0,
            active: true,
        };
    }

    /// Fill an interleaved stereo buffer. Returns frames written.
    pub fn fill(&mut self, buffer: &mut [i16]) -> usize {
        let triggers = self.pending.swap(0, Ordering::Relaxed);
        if !self.sample.is_empty() {
            for _ in 0..triggers {
                self.start_voice();
            }
        }

        let frames = buffer.len() / CHANNELS;
        for frame in buffer.chunks_exact_mut(CHANNELS) {
            let mut mix = 0.0f64;
            for voice in self.voices.iter_mut().filter(|v| v.active) {
                mix += self.sample[voice.position] as f64;
                voice.position += 1;
                if voice.position >= self.sample.len() {
                    voice.active = false;
                }
            }
            let value = (mix * self.volume)
                .round()
                .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
            frame.fill(value);
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(len: usize, level: f32) -> (ShakeTrigger, ShakerPlayer) {
        shaker_channel(ShakerSample::from_mono(vec![level; len], 44_100), 1000.0)
    }

    fn render(player: &mut ShakerPlayer, frames: usize) -> Vec<i16> {
        let mut buf = vec![0i16; frames * CHANNELS];
        assert_eq!(player.fill(&mut buf), frames);
        buf
    }

    #[test]
    fn silent_until_triggered() {
        let (_trigger, mut player) = player(100, 0.25);
        assert!(render(&mut player, 32).iter().all(|&s| s == 0));
        assert_eq!(player.active_voices(), 0);
    }

    #[test]
    fn voices_overlap() {
        let (trigger, mut player) = player(100, 0.25);
        trigger.trigger();
        let first = render(&mut player, 60);
        assert!(first.iter().all(|&s| s == 250));

        trigger.trigger();
        let both = render(&mut player, 40);
        assert!(both.iter().all(|&s| s == 500));
        assert_eq!(player.active_voices(), 1);

        let second_only = render(&mut player, 60);
        assert!(second_only.iter().all(|&s| s == 250));
        assert_eq!(player.active_voices(), 0);
        assert!(render(&mut player, 8).iter().all(|&s| s == 0));
    }

    #[test]
    fn triggers_between_buffers_accumulate() {
        let (trigger, mut player) = player(100, 0.25);
        trigger.trigger();
        trigger.trigger();
        trigger.trigger();
        assert!(render(&mut player, 4).iter().all(|&s| s == 750));
        assert_eq!(player.active_voices(), 3);
    }

    #[test]
    fn oldest_voice_restarted_when_full() {
        let (trigger, mut player) = player(1000, 0.001);
        for _ in 0..MAX_VOICES {
            trigger.trigger();
            render(&mut player, 10);
        }
        assert_eq!(player.active_voices(), MAX_VOICES);
        let oldest = player.voices.iter().map(|v| v.position).max();
        assert_eq!(oldest, Some(10 * MAX_VOICES));

        trigger.trigger();
        render(&mut player, 1);
        assert_eq!(player.active_voices(), MAX_VOICES);
        let oldest = player.voices.iter().map(|v| v.position).max();
        assert_eq!(oldest, Some(10 * (MAX_VOICES - 1) + 1));
    }

    #[test]
    fn mix_clamped_to_sample_range() {
        let (trigger, mut player) = shaker_channel(
            ShakerSample::from_mono(vec![1.0; 16], 44_100),
            i16::MAX as f64,
        );
        trigger.trigger();
        trigger.trigger();
        assert!(render(&mut player, 4).iter().all(|&s| s == i16::MAX));
    }

    #[test]
    fn empty_sample_never_starts_voices() {
        let (trigger, mut player) = player(0, 0.5);
        trigger.trigger();
        assert!(render(&mut player, 8).iter().all(|&s| s == 0));
        assert_eq!(player.active_voices(), 0);
    }
}
