//! Sessions: the live control loop and the offline render session.
//!
//! [`run_control_loop`] pumps sensor events on the control thread while the
//! audio callback plays. [`OfflineSession`] runs both halves on one thread for
//! renders: orientation updates from a [`Sweep`] are applied at their own
//! rate, splitting each audio buffer at update boundaries so the synth sees
//! every note change at the right frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::instrument::Instrument;
use crate::motion::sweep::Sweep;
use crate::motion::{SensorDisconnected, SensorEvent, SensorReceiver};
use crate::synth::{ToneSynthesizer, CHANNELS};

/// Feed sensor events to `handle` until `running` clears.
///
/// Waits up to `poll` per iteration. Returns [`SensorDisconnected`] once the
/// sensor has gone away and its queued events have been handled.
pub fn run_control_loop<F>(
    sensor: &SensorReceiver,
    running: &AtomicBool,
    poll: Duration,
    mut handle: F,
) -> Result<(), SensorDisconnected>
where
    F: FnMut(SensorEvent),
{
    while running.load(Ordering::Relaxed) {
        if let Some(event) = sensor.poll_timeout(poll)? {
            handle(event);
        }
        for event in sensor.drain() {
            handle(event);
        }
    }
    Ok(())
}

/// Instrument, synth and simulated sensor advanced together, frame-accurately.
pub struct OfflineSession {
    instrument: Instrument,
    synth: ToneSynthesizer,
    sweep: Sweep,
    frames_per_update: f64,
    frames_until_update: f64,
}

impl OfflineSession {
    pub fn new(instrument: Instrument, sweep: Sweep, sample_rate: u32) -> Self {
        let synth = instrument.synthesizer(sample_rate);
        let frames_per_update = (sample_rate as f64 / sweep.update_hz()).max(1.0);
        Self {
            instrument,
            synth,
            sweep,
            frames_per_update,
            frames_until_update: 0.0,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut Instrument {
        &mut self.instrument
    }

    /// Render whole stereo frames into `buffer`, applying sensor updates as they fall due.
    pub fn fill(&mut self, buffer: &mut [i16]) {
        let total = buffer.len() / CHANNELS;
        let mut done = 0;
        while done < total {
            if self.frames_until_update <= 0.0 {
                let attitude = self.sweep.next_sample();
                self.instrument.on_orientation_sample(&attitude);
                self.frames_until_update += self.frames_per_update;
            }
            let span = (self.frames_until_update.ceil() as usize).clamp(1, total - done);
            self.synth.render(&mut buffer[done * CHANNELS..], span);
            done += span;
            self.frames_until_update -= span as f64;
        }
    }
}
