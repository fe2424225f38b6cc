//! Signal chain integration tests: orientation → note → frequency → samples.
//!
//! No audio hardware involved: the synthesizer is driven directly, the way the
//! audio callback would drive it.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;

use assert_approx_eq::assert_approx_eq;

use rotophone::instrument::{note_channel, GateMode, Instrument};
use rotophone::motion::{sensor_channel, OrientationTracker, Quaternion, SensorEvent};
use rotophone::scale::{note_to_frequency, PitchClass, Scale, ScaleSpec, ScaleType};
use rotophone::synth::{SynthControls, ToneSynthesizer, Waveform, MAX_VOLUME, SAMPLE_RATE};

fn playing() -> Instrument {
    let mut instrument = Instrument::default();
    instrument.set_play_gate(true, true);
    instrument
}

fn render(synth: &mut ToneSynthesizer, frames: usize) -> Vec<i16> {
    let mut buf = vec![0i16; frames * 2];
    synth.fill(&mut buf);
    buf
}

// =============================================================================
// Scale and pitch
// =============================================================================

#[test]
fn c_major_pentatonic_two_octaves() {
    let scale = Scale::generate(&ScaleSpec::new(
        PitchClass::C,
        ScaleType::MajorPentatonic,
        4,
        6,
    ));
    assert_eq!(scale.notes(), &[40, 42, 44, 47, 49, 52, 54, 56, 59, 61, 64]);
}

#[test]
fn reference_pitches() {
    assert_approx_eq!(note_to_frequency(49), 440.0, 1e-9);
    assert_approx_eq!(note_to_frequency(61), 880.0, 1e-9);
}

#[test]
fn wheel_ends_map_to_scale_ends() {
    let mut instrument = playing();
    assert_eq!(instrument.set_angle(0.0), 40);
    assert_eq!(instrument.set_angle(TAU - 1e-9), 64);
    assert_approx_eq!(instrument.frequency(), note_to_frequency(64), 1e-9);
}

#[test]
fn calibrated_attitude_selects_note() {
    // Default calibration puts a quarter-turn yaw at the start of the wheel.
    let mut instrument = playing();
    let note = instrument.on_orientation_sample(&Quaternion::from_yaw(FRAC_PI_2 + 0.1));
    assert_eq!(note, 40);
    assert_approx_eq!(instrument.angle(), 0.1, 1e-9);

    // Without calibration the same attitude lands a quarter of the way round.
    let mut raw = Instrument::new(ScaleSpec::default(), OrientationTracker::new(0.0));
    assert_eq!(raw.on_orientation_sample(&Quaternion::from_yaw(FRAC_PI_2 + 0.1)), 44);
}

#[test]
fn scale_change_requantizes_current_angle() {
    let mut instrument = playing();
    instrument.set_angle(TAU - 1e-9);
    instrument.set_scale(PitchClass::A, ScaleType::Chromatic, 2, 3);
    // A2 is note 25; the last slot is the closing tonic one octave up.
    assert_eq!(instrument.note(), Some(37));
    assert_approx_eq!(instrument.frequency(), 220.0, 1e-9);
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn sensor_events_drive_gate_and_notes() {
    let mut instrument = Instrument::default();
    instrument.set_enabled(true);
    let (notes_tx, mut notes_rx) = note_channel(16);
    instrument.set_observer(notes_tx);

    let (tx, rx) = sensor_channel();
    tx.send(SensorEvent::Press(true)).unwrap();
    tx.send(SensorEvent::Orientation(Quaternion::from_yaw(FRAC_PI_2 + 0.1)))
        .unwrap();
    tx.send(SensorEvent::Orientation(Quaternion::from_yaw(FRAC_PI_2 + 0.11)))
        .unwrap();
    tx.send(SensorEvent::Orientation(Quaternion::from_yaw(FRAC_PI_2 + 1.1)))
        .unwrap();
    for event in rx.drain() {
        instrument.apply(event);
    }

    assert!(instrument.is_audible());
    let changes = notes_rx.drain();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].previous, None);
    assert_eq!(changes[0].note, 40);
    assert_eq!(changes[1].previous, Some(40));
    assert_eq!(changes[1].note, 42);
}

#[test]
fn tap_to_mute_inverts_press() {
    let mut instrument = Instrument::default();
    instrument.set_gate_mode(GateMode::TapToMute);
    instrument.set_play_gate(true, false);
    assert!(instrument.is_audible());
    instrument.apply(SensorEvent::Press(true));
    assert!(!instrument.is_audible());
}

// =============================================================================
// Audio
// =============================================================================

#[test]
fn gate_closed_renders_silence() {
    let instrument = Instrument::default();
    let mut synth = instrument.synthesizer(SAMPLE_RATE);
    assert!(render(&mut synth, 1024).iter().all(|&s| s == 0));
}

#[test]
fn mute_and_resume_stays_in_phase() {
    let mut instrument = playing();
    instrument.set_angle(0.0);
    let mut synth = instrument.synthesizer(SAMPLE_RATE);

    let reference_controls = Arc::new(SynthControls::new(
        instrument.frequency(),
        MAX_VOLUME,
        true,
        Waveform::Sine,
    ));
    let mut reference = ToneSynthesizer::new(reference_controls, SAMPLE_RATE);

    let (n, m, k) = (300, 500, 400);
    assert_eq!(render(&mut synth, n), render(&mut reference, n));

    instrument.set_volume(0.0);
    assert!(render(&mut synth, m).iter().all(|&s| s == 0));
    render(&mut reference, m);

    instrument.set_volume(MAX_VOLUME);
    assert_eq!(render(&mut synth, k), render(&mut reference, k));
    assert_approx_eq!(synth.phase(), reference.phase(), 1e-9);
}

#[test]
fn phase_continuous_across_callbacks() {
    let controls = Arc::new(SynthControls::new(523.25, MAX_VOLUME, true, Waveform::Triangle));
    let mut whole = ToneSynthesizer::new(controls.clone(), SAMPLE_RATE);
    let mut split = ToneSynthesizer::new(controls, SAMPLE_RATE);

    let expected = render(&mut whole, 700);
    let mut joined = render(&mut split, 256);
    joined.extend(render(&mut split, 444));
    assert_eq!(joined, expected);
}

#[test]
fn note_change_takes_effect_next_buffer() {
    let mut instrument = playing();
    instrument.set_angle(0.0);
    let mut synth = instrument.synthesizer(SAMPLE_RATE);
    render(&mut synth, 128);
    assert_approx_eq!(synth.current().frequency, note_to_frequency(40), 1e-9);

    instrument.set_angle(TAU - 1e-9);
    assert_approx_eq!(synth.current().frequency, note_to_frequency(40), 1e-9);
    render(&mut synth, 128);
    assert_approx_eq!(synth.current().frequency, note_to_frequency(64), 1e-9);
}

#[test]
fn every_waveform_within_half_scale() {
    let mut instrument = playing();
    instrument.set_angle(1.0);
    let mut synth = instrument.synthesizer(SAMPLE_RATE);
    for waveform in [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ] {
        instrument.set_waveform(waveform);
        let buf = render(&mut synth, 2048);
        let peak = buf.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        assert!(peak > 0, "{waveform} silent");
        assert!(peak <= 16384, "{waveform} peak {peak}");
    }
}
