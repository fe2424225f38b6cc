//! Instrument: the control surface tying orientation, scale and synth together.
//!
//! [`Instrument`] lives on the control thread. It owns the generated scale and
//! the play gate, turns orientation samples into notes, and publishes the
//! resulting frequency, volume, gate and waveform through [`SynthControls`]
//! for the audio thread.

pub mod event;
pub mod gate;

use std::sync::Arc;

pub use event::{note_channel, NoteChange, NoteObserver, NoteReceiver, NoteSender};
pub use gate::{GateMode, PlayGate};

use crate::config::RotophoneConfig;
use crate::motion::{OrientationTracker, Quaternion, SensorEvent};
use crate::scale::{self, PitchClass, Scale, ScaleSpec, ScaleType};
use crate::synth::{SynthControls, ToneSynthesizer, Waveform, MAX_VOLUME};

/// Control-thread state of the instrument.
pub struct Instrument {
    spec: ScaleSpec,
    scale: Scale,
    tracker: OrientationTracker,
    gate: PlayGate,
    volume: f64,
    waveform: Waveform,
    angle: f64,
    note: Option<i32>,
    controls: Arc<SynthControls>,
    observer: Option<Box<dyn NoteObserver>>,
}

impl Instrument {
    /// Create an instrument with the given scale and calibration. Starts at full
    /// volume with a sine wave and the gate disabled.
    pub fn new(spec: ScaleSpec, tracker: OrientationTracker) -> Self {
        let scale = Scale::generate(&spec);
        let gate = PlayGate::default();
        let waveform = Waveform::default();
        let controls = Arc::new(SynthControls::new(
            scale::note_to_frequency(scale.notes()[0]),
            MAX_VOLUME,
            gate.is_open(),
            waveform,
        ));
        Self {
            spec,
            scale,
            tracker,
            gate,
            volume: MAX_VOLUME,
            waveform,
            angle: 0.0,
            note: None,
            controls,
            observer: None,
        }
    }

    /// Build an instrument from a validated configuration.
    pub fn from_config(config: &RotophoneConfig) -> Self {
        let mut instrument = Self::new(
            config.scale_spec(),
            OrientationTracker::new(config.calibration_offset),
        );
        instrument.set_waveform(config.waveform);
        instrument.set_volume(config.volume);
        instrument.set_gate_mode(config.gate_mode);
        instrument.set_enabled(config.sound_enabled);
        instrument
    }

    /// Shared handle to the parameters read by the audio thread.
    pub fn controls(&self) -> Arc<SynthControls> {
        self.controls.clone()
    }

    /// A synthesizer wired to this instrument's controls, ready to move onto the audio thread.
    pub fn synthesizer(&self, sample_rate: u32) -> ToneSynthesizer {
        ToneSynthesizer::new(self.controls(), sample_rate)
    }

    /// Register the note-changed observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl NoteObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    // ----- scale -----

    pub fn set_scale(
        &mut self,
        tonic: PitchClass,
        scale_type: ScaleType,
        min_octave: i32,
        max_octave: i32,
    ) {
        self.set_scale_spec(ScaleSpec::new(tonic, scale_type, min_octave, max_octave));
    }

    /// Replace the scale spec and regenerate the scale.
    ///
    /// If a note is already sounding it is requantized at the current angle.
    pub fn set_scale_spec(&mut self, spec: ScaleSpec) {
        self.scale = Scale::generate(&spec);
        self.spec = spec;
        log::debug!(
            "scale {} {:?} octaves {}..={} ({} notes)",
            self.spec.tonic,
            self.spec.intervals.as_slice(),
            self.spec.min_octave,
            self.spec.max_octave,
            self.scale.len()
        );
        if self.note.is_some() {
            self.set_angle(self.angle);
        }
    }

    pub fn spec(&self) -> &ScaleSpec {
        &self.spec
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    // ----- synth parameters -----

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        self.controls.set_waveform(waveform);
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set the output level, clamped to `0..=MAX_VOLUME`.
    pub fn set_volume(&mut self, level: f64) {
        let clamped = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, MAX_VOLUME)
        };
        if clamped != level {
            log::warn!("volume {level} out of range, using {clamped}");
        }
        self.volume = clamped;
        self.controls.set_volume(clamped);
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    // ----- gate -----

    pub fn set_play_gate(&mut self, enabled: bool, pressed: bool) {
        self.gate.enabled = enabled;
        self.gate.pressed = pressed;
        self.publish_gate();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.gate.enabled = enabled;
        self.publish_gate();
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.gate.pressed = pressed;
        self.publish_gate();
    }

    pub fn set_gate_mode(&mut self, mode: GateMode) {
        self.gate.mode = mode;
        self.publish_gate();
    }

    pub fn gate(&self) -> PlayGate {
        self.gate
    }

    pub fn is_audible(&self) -> bool {
        self.gate.is_open()
    }

    fn publish_gate(&mut self) {
        self.controls.set_audible(self.gate.is_open());
    }

    // ----- orientation -----

    /// Feed one orientation sample. Returns the resulting note number.
    pub fn on_orientation_sample(&mut self, attitude: &Quaternion) -> i32 {
        let angle = self.tracker.compute_angle(attitude);
        self.set_angle(angle)
    }

    /// Apply a wheel angle directly (radians, `[0, 2π)`). Returns the note number.
    ///
    /// Publishes the note's frequency and notifies the observer when the note
    /// differs from the previous one.
    pub fn set_angle(&mut self, angle: f64) -> i32 {
        self.angle = angle;
        let note = scale::quantize(angle, &self.scale);
        let frequency = scale::note_to_frequency(note);
        self.controls.set_frequency(frequency);

        let previous = self.note.replace(note);
        if previous != Some(note) {
            let change = NoteChange {
                note,
                previous,
                frequency,
                angle,
            };
            if let Some(observer) = self.observer.as_mut() {
                observer.note_changed(&change);
            }
        }
        note
    }

    /// Route a sensor event to the matching setter. Acceleration is ignored.
    pub fn apply(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Orientation(attitude) => {
                self.on_orientation_sample(&attitude);
            }
            SensorEvent::Press(pressed) => self.set_pressed(pressed),
            SensorEvent::Acceleration { .. } => {}
        }
    }

    /// Most recent wheel angle in radians.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Current note number, `None` until the first orientation sample.
    pub fn note(&self) -> Option<i32> {
        self.note
    }

    /// Frequency currently published to the synth.
    pub fn frequency(&self) -> f64 {
        self.controls.frequency()
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new(ScaleSpec::default(), OrientationTracker::default())
    }
}
