//! Simulated sensor: spins the device about its vertical axis at a steady rate.
//!
//! Used for demos and offline renders where no real attitude source exists.
//! Optional jitter is drawn from a seeded RNG so runs are reproducible.

use std::f64::consts::{PI, TAU};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{Quaternion, SensorEvent, SensorSender};

/// Deterministic sequence of attitude samples for a constant-rate rotation.
#[derive(Debug, Clone)]
pub struct Sweep {
    revolutions_per_second: f64,
    update_hz: f64,
    jitter: f64,
    rng: ChaCha8Rng,
    step: u64,
}

impl Sweep {
    /// `jitter` is the maximum yaw noise in radians added to each sample,
    /// capped at half a turn.
    ///
    /// Non-finite arguments are replaced (speed and jitter by 0, rate by 1 Hz)
    /// with a warning.
    pub fn new(revolutions_per_second: f64, update_hz: f64, jitter: f64, seed: u64) -> Self {
        Self {
            revolutions_per_second: finite_or(revolutions_per_second, 0.0, "sweep speed"),
            update_hz: finite_or(update_hz, 1.0, "sweep rate").max(1.0),
            jitter: finite_or(jitter, 0.0, "sweep jitter").abs().min(PI),
            rng: ChaCha8Rng::seed_from_u64(seed),
            step: 0,
        }
    }

    pub fn update_hz(&self) -> f64 {
        self.update_hz
    }

    /// Time between samples.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.update_hz)
    }

    /// Produce the next attitude sample.
    pub fn next_sample(&mut self) -> Quaternion {
        let t = self.step as f64 / self.update_hz;
        self.step += 1;
        let mut yaw = (TAU * self.revolutions_per_second * t).rem_euclid(TAU);
        if self.jitter > 0.0 {
            yaw += self.rng.gen_range(-self.jitter..=self.jitter);
        }
        Quaternion::from_yaw(yaw)
    }
}

fn finite_or(value: f64, fallback: f64, what: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::warn!("{what} {value} is not finite, using {fallback}");
        fallback
    }
}

impl Iterator for Sweep {
    type Item = Quaternion;

    fn next(&mut self) -> Option<Quaternion> {
        Some(self.next_sample())
    }
}

/// Background thread that feeds a [`Sweep`] into a sensor channel in real time.
pub struct SweepSensor {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SweepSensor {
    /// Start emitting samples. When `hold_pressed` is set the play gesture is
    /// reported as held for the whole run.
    pub fn start(mut sweep: Sweep, hold_pressed: bool, sender: SensorSender) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();
        let interval = sweep.interval();

        let thread = thread::spawn(move || {
            if hold_pressed && sender.send(SensorEvent::Press(true)).is_err() {
                return;
            }
            while !stop_clone.load(Ordering::Relaxed) {
                if sender
                    .send(SensorEvent::Orientation(sweep.next_sample()))
                    .is_err()
                {
                    break;
                }
                thread::sleep(interval);
            }
        });

        log::info!(
            "simulated sensor sweeping at {:.1} Hz",
            1.0 / interval.as_secs_f64()
        );
        Self {
            stop_flag,
            thread: Some(thread),
        }
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SweepSensor {
    fn drop(&mut self) {
        self.stop();
    }
}
