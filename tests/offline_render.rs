//! Offline render integration tests: config → instrument → sweep → WAV file.

use rotophone::audio::{AudioOutput, WavRecorder};
use rotophone::config::RotophoneConfig;
use rotophone::instrument::{Instrument, NoteChange};
use rotophone::motion::sweep::Sweep;
use rotophone::scale::{PitchClass, ScaleType};
use rotophone::session::OfflineSession;
use rotophone::synth::Waveform;

use std::sync::{Arc, Mutex};

const SAMPLE_RATE: u32 = 44_100;

fn read_wav(path: &std::path::Path) -> (hound::WavSpec, Vec<i16>) {
    let reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    (spec, samples)
}

fn render_to(path: &std::path::Path, config: &RotophoneConfig, frames: u64) -> Vec<NoteChange> {
    let mut instrument = Instrument::from_config(config);
    instrument.set_play_gate(true, true);
    let changes = Arc::new(Mutex::new(Vec::new()));
    let record = changes.clone();
    instrument.set_observer(move |change: &NoteChange| record.lock().unwrap().push(*change));

    let sweep = Sweep::new(1.0, config.motion_update_hz, 0.0, 1);
    let mut session = OfflineSession::new(instrument, sweep, config.sample_rate);
    let mut recorder = WavRecorder::new(path, config.sample_rate, frames);
    recorder
        .start(Box::new(move |buf: &mut [i16]| session.fill(buf)))
        .unwrap();

    let result = changes.lock().unwrap().clone();
    result
}

#[test]
fn one_second_sweep_plays_every_note() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.wav");
    let config = RotophoneConfig::default();

    let changes = render_to(&path, &config, SAMPLE_RATE as u64);

    let (spec, samples) = read_wav(&path);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(samples.len(), 2 * SAMPLE_RATE as usize);
    assert!(samples.chunks_exact(2).all(|f| f[0] == f[1]));

    // One revolution visits all 11 slots of C major pentatonic 4..6.
    let mut notes: Vec<i32> = changes.iter().map(|c| c.note).collect();
    notes.sort_unstable();
    notes.dedup();
    assert_eq!(notes, vec![40, 42, 44, 47, 49, 52, 54, 56, 59, 61, 64]);
}

#[test]
fn render_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let config = RotophoneConfig::default();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    render_to(&a, &config, 10_000);
    render_to(&b, &config, 10_000);
    assert_eq!(read_wav(&a).1, read_wav(&b).1);
}

#[test]
fn config_file_shapes_the_render() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        "tonic: A\nscale_type: Blues\nmin_octave: 3\nmax_octave: 4\nwaveform: Square\nvolume: 8000\nmotion_update_hz: 20\n",
    )
    .unwrap();

    let config = RotophoneConfig::load_from(&config_path).unwrap();
    assert_eq!(config.tonic, PitchClass::A);
    assert_eq!(config.scale_type, ScaleType::Blues);
    assert_eq!(config.waveform, Waveform::Square);

    let wav = dir.path().join("blues.wav");
    let changes = render_to(&wav, &config, 22_050);
    // A3 is note 37: blues on A over one octave, then the closing A4.
    assert!(changes
        .iter()
        .all(|c| [37, 40, 42, 43, 44, 47, 49].contains(&c.note)));

    let (_, samples) = read_wav(&wav);
    // Square wave at half of volume 8000.
    assert!(samples.iter().all(|&s| s == 4000 || s == -4000));
}
