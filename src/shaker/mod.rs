//! Shaker: a second motion instrument that plays a percussive sample per shake.
//!
//! [`ShakeDetector`] turns user-acceleration samples into shake events on the
//! control thread. A shake fires once on the rising edge: the magnitude must
//! reach the threshold while the previous sample was still below it. Each
//! event triggers a voice on the [`ShakerPlayer`], which mixes overlapping
//! voices on the audio thread.

pub mod player;
pub mod sample;

pub use player::{shaker_channel, ShakeTrigger, ShakerPlayer, MAX_VOICES};
pub use sample::{SampleError, ShakerSample};

use crate::motion::SensorEvent;

/// Acceleration threshold in g at sensitivity 0.
pub const LEAST_SENSITIVE_THRESHOLD: f64 = 3.0;

/// Acceleration threshold in g at sensitivity 1.
pub const MOST_SENSITIVE_THRESHOLD: f64 = 0.25;

pub const DEFAULT_SENSITIVITY: f64 = 0.7;

/// Emitted once per detected shake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeEvent {
    /// Acceleration magnitude in g that crossed the threshold.
    pub magnitude: f64,
    /// Threshold in effect, g.
    pub threshold: f64,
}

/// Receives shake events. Implemented for closures.
pub trait ShakeObserver: Send {
    fn shaken(&mut self, event: &ShakeEvent);
}

impl<F> ShakeObserver for F
where
    F: FnMut(&ShakeEvent) + Send,
{
    fn shaken(&mut self, event: &ShakeEvent) {
        self(event)
    }
}

/// Edge-triggered shake detection over acceleration magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeDetector {
    sensitivity: f64,
    /// Last magnitude divided by the threshold; >= 1 means "still shaking".
    level: f64,
}

impl ShakeDetector {
    /// `sensitivity` in `0..=1`; out-of-range values are clamped.
    pub fn new(sensitivity: f64) -> Self {
        let mut detector = Self {
            sensitivity: DEFAULT_SENSITIVITY,
            level: 0.0,
        };
        detector.set_sensitivity(sensitivity);
        detector
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.sensitivity = if sensitivity.is_nan() {
            DEFAULT_SENSITIVITY
        } else {
            sensitivity.clamp(0.0, 1.0)
        };
    }

    /// Magnitude in g a shake must reach, interpolated between the least and
    /// most sensitive thresholds.
    pub fn threshold(&self) -> f64 {
        self.sensitivity * (MOST_SENSITIVE_THRESHOLD - LEAST_SENSITIVE_THRESHOLD)
            + LEAST_SENSITIVE_THRESHOLD
    }

    /// Most recent magnitude relative to the threshold.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Feed one user-acceleration sample (g). Returns an event on a new shake.
    pub fn on_acceleration(&mut self, x: f64, y: f64, z: f64) -> Option<ShakeEvent> {
        let magnitude = (x * x + y * y + z * z).sqrt();
        let threshold = self.threshold();
        let rising = magnitude >= threshold && self.level < 1.0;
        self.level = magnitude / threshold;
        rising.then_some(ShakeEvent {
            magnitude,
            threshold,
        })
    }
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

/// Control-thread side of the shaker: detection plus voice triggering.
pub struct Shaker {
    detector: ShakeDetector,
    trigger: ShakeTrigger,
    observer: Option<Box<dyn ShakeObserver>>,
}

impl Shaker {
    pub fn new(detector: ShakeDetector, trigger: ShakeTrigger) -> Self {
        Self {
            detector,
            trigger,
            observer: None,
        }
    }

    /// Register the shake observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl ShakeObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn detector(&self) -> &ShakeDetector {
        &self.detector
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.detector.set_sensitivity(sensitivity);
    }

    /// Handle a sensor event. Only acceleration matters here.
    pub fn apply(&mut self, event: SensorEvent) -> Option<ShakeEvent> {
        let SensorEvent::Acceleration { x, y, z } = event else {
            return None;
        };
        let shake = self.detector.on_acceleration(x, y, z)?;
        self.trigger.trigger();
        if let Some(observer) = self.observer.as_mut() {
            observer.shaken(&shake);
        }
        Some(shake)
    }
}
