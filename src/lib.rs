//! Rotophone: a motion-controlled instrument.
//!
//! Device orientation is turned into an angle on a scale wheel, quantized to a
//! note of the selected scale, and played by a click-free oscillator. The
//! control side ([`instrument`], [`motion`], [`scale`]) and the audio side
//! ([`synth`], [`audio`]) run on separate threads and share only atomics.
//! [`shaker`] is a second instrument that plays a percussive sample per shake.

pub mod audio;
pub mod config;
pub mod instrument;
pub mod motion;
pub mod scale;
pub mod session;
pub mod shaker;
pub mod synth;
