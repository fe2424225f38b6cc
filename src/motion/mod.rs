//! Motion input: device attitude to wheel angle, plus the sensor drivers that feed it.
//!
//! Sensor drivers run on their own threads and deliver [`SensorEvent`]s through an
//! mpsc channel. The control loop drains the channel and hands each orientation
//! to the instrument, which runs it through [`OrientationTracker`].

pub mod osc;
pub mod sweep;

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::sync::mpsc;

pub use osc::OscSensor;
pub use sweep::SweepSensor;

/// Offset added to the raw yaw so that the device's resting "north" lands on
/// the first slot of the scale wheel.
pub const DEFAULT_CALIBRATION_OFFSET: f64 = PI + PI / 2.0;

/// Device attitude as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Pure rotation of `yaw` radians about the vertical (z) axis.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw / 2.0;
        Self::new(half.cos(), 0.0, 0.0, half.sin())
    }

    /// Yaw (rotation about z) in radians, in `[-π, π]`.
    pub fn yaw(&self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp)
    }
}

/// Reduce an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Converts orientation samples into a wheel angle in `[0, 2π)`.
///
/// Stateless apart from the calibration offset. Does not filter or throttle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationTracker {
    offset: f64,
}

impl OrientationTracker {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn compute_angle(&self, attitude: &Quaternion) -> f64 {
        normalize_angle(attitude.yaw() + self.offset)
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_OFFSET)
    }
}

/// Wheel angle for `attitude` using the default calibration offset.
pub fn compute_angle(attitude: &Quaternion) -> f64 {
    OrientationTracker::default().compute_angle(attitude)
}

/// Input delivered by a sensor driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    /// A new device attitude sample.
    Orientation(Quaternion),
    /// The play gesture was pressed (`true`) or released (`false`).
    Press(bool),
    /// User acceleration (gravity removed) in g, device axes.
    Acceleration { x: f64, y: f64, z: f64 },
}

/// Every sensor sender is gone; no further events can arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDisconnected;

impl fmt::Display for SensorDisconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor disconnected")
    }
}

impl std::error::Error for SensorDisconnected {}

/// Sender half: cloned into each sensor thread.
pub type SensorSender = mpsc::Sender<SensorEvent>;

/// Receiver half: held by the control loop.
pub struct SensorReceiver {
    rx: mpsc::Receiver<SensorEvent>,
}

impl SensorReceiver {
    /// Non-blocking poll for the next event.
    pub fn poll(&self) -> Option<SensorEvent> {
        self.rx.try_recv().ok()
    }

    /// Block up to `timeout` for the next event.
    ///
    /// `Ok(None)` on timeout. Pending events are still delivered after the
    /// senders are dropped; once they are exhausted this returns
    /// [`SensorDisconnected`] immediately.
    pub fn poll_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<Option<SensorEvent>, SensorDisconnected> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(SensorDisconnected),
        }
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<SensorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Create a new sensor channel pair.
pub fn sensor_channel() -> (SensorSender, SensorReceiver) {
    let (tx, rx) = mpsc::channel();
    (tx, SensorReceiver { rx })
}
