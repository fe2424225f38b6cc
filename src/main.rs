//! Rotophone: play a scale by turning the device.
//!
//! `play` drives the sound card from a live orientation source (OSC or a
//! simulated sweep); `render` writes a simulated performance to a WAV file;
//! `shake` plays a percussive sample for each shake reported over OSC.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use rotophone::audio::{AudioEngine, AudioOutput, WavRecorder};
use rotophone::config::RotophoneConfig;
use rotophone::instrument::event::NOTE_CHANNEL_CAPACITY;
use rotophone::instrument::{note_channel, GateMode, Instrument, NoteChange};
use rotophone::motion::sweep::Sweep;
use rotophone::motion::{sensor_channel, OscSensor, SweepSensor};
use rotophone::scale::{note_name, PitchClass, ScaleType};
use rotophone::session::{run_control_loop, OfflineSession};
use rotophone::shaker::{shaker_channel, ShakeDetector, ShakeEvent, Shaker, ShakerSample};
use rotophone::synth::Waveform;

/// Control loop wait per iteration.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Parser)]
#[command(name = "rotophone", version, about = "Turn the device, play the scale")]
struct Cli {
    /// Config file (default: ~/.rotophone/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play live through the default audio device
    Play {
        #[command(flatten)]
        sound: SoundArgs,
        /// Listen for OSC orientation on this UDP port
        #[arg(long, conflicts_with = "sweep")]
        osc_port: Option<u16>,
        /// Use a simulated sensor turning at this many revolutions per second
        #[arg(long)]
        sweep: Option<f64>,
    },
    /// Render a simulated sweep to a WAV file
    Render {
        #[command(flatten)]
        sound: SoundArgs,
        /// Output file
        #[arg(long)]
        out: PathBuf,
        /// Length in seconds
        #[arg(long, default_value_t = 5.0)]
        seconds: f64,
        /// Revolutions per second of the simulated sensor
        #[arg(long, default_value_t = 0.25)]
        sweep: f64,
        /// Maximum random yaw wobble in radians
        #[arg(long, default_value_t = 0.0)]
        jitter: f64,
        /// Seed for the wobble
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Play a shaker sound for each shake reported over OSC
    Shake {
        /// Listen for OSC acceleration on this UDP port
        #[arg(long)]
        osc_port: Option<u16>,
        /// 0 (hard shakes only) ..= 1 (light taps)
        #[arg(long)]
        sensitivity: Option<f64>,
        /// WAV file to play instead of the synthesized shaker
        #[arg(long)]
        sample: Option<PathBuf>,
        /// Output level, 0..=32767
        #[arg(long)]
        volume: Option<f64>,
    },
}

/// Parameters of a `render` run.
struct RenderArgs<'a> {
    out: &'a PathBuf,
    seconds: f64,
    rps: f64,
    jitter: f64,
    seed: u64,
}

/// Overrides for the sound settings in the config file.
#[derive(Args)]
struct SoundArgs {
    #[arg(long)]
    tonic: Option<PitchClass>,
    #[arg(long)]
    scale: Option<ScaleType>,
    #[arg(long)]
    min_octave: Option<i32>,
    #[arg(long)]
    max_octave: Option<i32>,
    #[arg(long)]
    waveform: Option<Waveform>,
    /// Output level, 0..=32767
    #[arg(long)]
    volume: Option<f64>,
    /// Sound unless pressed, instead of only while pressed
    #[arg(long)]
    tap_to_mute: bool,
}

impl SoundArgs {
    fn apply(&self, config: &mut RotophoneConfig) {
        if let Some(tonic) = self.tonic {
            config.tonic = tonic;
        }
        if let Some(scale) = self.scale {
            config.scale_type = scale;
            config.intervals = None;
        }
        if let Some(min) = self.min_octave {
            config.min_octave = min;
        }
        if let Some(max) = self.max_octave {
            config.max_octave = max;
        }
        if let Some(waveform) = self.waveform {
            config.waveform = waveform;
        }
        if let Some(volume) = self.volume {
            config.volume = volume;
        }
        if self.tap_to_mute {
            config.gate_mode = GateMode::TapToMute;
        }
    }
}

fn read_config(path: Option<&PathBuf>) -> Result<RotophoneConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => RotophoneConfig::load_from(path)?,
        None => RotophoneConfig::load(),
    })
}

fn load_config(
    path: Option<&PathBuf>,
    sound: &SoundArgs,
) -> Result<RotophoneConfig, Box<dyn std::error::Error>> {
    let mut config = read_config(path)?;
    sound.apply(&mut config);
    config.validate()?;
    log::info!(
        "{} {} octaves {}..={}, {} wave",
        config.tonic,
        config.scale_type,
        config.min_octave,
        config.max_octave,
        config.waveform
    );
    Ok(config)
}

fn log_note(change: &NoteChange) {
    log::info!(
        "note {} ({:.2} Hz)",
        note_name(change.note),
        change.frequency
    );
}

/// Sensor kept alive for the duration of `play`.
enum ActiveSensor {
    Osc(OscSensor),
    Sweep(SweepSensor),
}

fn play(
    config_path: Option<&PathBuf>,
    sound: &SoundArgs,
    osc_port: Option<u16>,
    sweep: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path, sound)?;
    config.sound_enabled = true;

    let mut instrument = Instrument::from_config(&config);
    let (note_tx, mut note_rx) = note_channel(NOTE_CHANNEL_CAPACITY);
    instrument.set_observer(note_tx);

    let mut engine = AudioEngine::new(config.sample_rate)?;
    let mut synth = instrument.synthesizer(engine.sample_rate());
    engine.start(Box::new(move |buf: &mut [i16]| {
        synth.fill(buf);
    }))?;

    let (sensor_tx, sensor_rx) = sensor_channel();
    let sensor = match sweep {
        Some(rps) => {
            let sweep = Sweep::new(rps, config.motion_update_hz, 0.0, 0);
            let hold = config.gate_mode == GateMode::HoldToPlay;
            ActiveSensor::Sweep(SweepSensor::start(sweep, hold, sensor_tx))
        }
        None => {
            let port = osc_port.unwrap_or(config.osc_port);
            ActiveSensor::Osc(OscSensor::start(port, sensor_tx)?)
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::Relaxed))?;
    log::info!("playing, press Ctrl-C to stop");

    let outcome = run_control_loop(&sensor_rx, &running, POLL_INTERVAL, |event| {
        instrument.apply(event);
        for change in note_rx.drain() {
            log_note(&change);
        }
    });
    if let Err(e) = &outcome {
        log::error!("{e}, stopping");
    }

    match sensor {
        ActiveSensor::Osc(mut osc) => osc.stop(),
        ActiveSensor::Sweep(mut sweep) => sweep.stop(),
    }
    engine.pause()?;
    for change in note_rx.drain() {
        log_note(&change);
    }
    let dropped = note_rx.dropped();
    if dropped > 0 {
        log::warn!("{dropped} note changes dropped, feedback queue was full");
    }
    log::info!("stopped");
    Ok(())
}

fn render(
    config_path: Option<&PathBuf>,
    sound: &SoundArgs,
    args: &RenderArgs<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    for (name, value) in [("sweep", args.rps), ("jitter", args.jitter)] {
        if !value.is_finite() {
            return Err(format!("--{name} must be a finite number, got {value}").into());
        }
    }
    let config = load_config(config_path, sound)?;
    let mut recorder = WavRecorder::with_duration(args.out, config.sample_rate, args.seconds)?;

    let mut instrument = Instrument::from_config(&config);
    instrument.set_play_gate(true, true);
    if config.gate_mode == GateMode::TapToMute {
        instrument.set_pressed(false);
    }

    let notes = Arc::new(AtomicUsize::new(0));
    let counter = notes.clone();
    instrument.set_observer(move |change: &NoteChange| {
        counter.fetch_add(1, Ordering::Relaxed);
        log::debug!("note {} at {:.3} rad", note_name(change.note), change.angle);
    });

    let sweep = Sweep::new(args.rps, config.motion_update_hz, args.jitter, args.seed);
    let mut session = OfflineSession::new(instrument, sweep, config.sample_rate);
    recorder.start(Box::new(move |buf: &mut [i16]| session.fill(buf)))?;

    log::info!("{} note changes rendered", notes.load(Ordering::Relaxed));
    Ok(())
}

fn shake(
    config_path: Option<&PathBuf>,
    osc_port: Option<u16>,
    sensitivity: Option<f64>,
    sample: Option<&PathBuf>,
    volume: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = read_config(config_path)?;
    if let Some(sensitivity) = sensitivity {
        config.shake_sensitivity = sensitivity;
    }
    if let Some(path) = sample {
        config.shaker_sample = Some(path.clone());
    }
    if let Some(volume) = volume {
        config.volume = volume;
    }
    config.validate()?;

    let mut engine = AudioEngine::new(config.sample_rate)?;
    let sound = match &config.shaker_sample {
        Some(path) => ShakerSample::load(path, engine.sample_rate())?,
        None => ShakerSample::synthesized(engine.sample_rate(), 0),
    };
    let (trigger, mut player) = shaker_channel(sound, config.volume);
    engine.start(Box::new(move |buf: &mut [i16]| {
        player.fill(buf);
    }))?;

    let detector = ShakeDetector::new(config.shake_sensitivity);
    log::info!(
        "shaker sensitivity {:.2} (threshold {:.2} g)",
        detector.sensitivity(),
        detector.threshold()
    );
    let mut shaker = Shaker::new(detector, trigger);
    shaker.set_observer(|event: &ShakeEvent| {
        log::info!("shake {:.2} g", event.magnitude);
    });

    let (sensor_tx, sensor_rx) = sensor_channel();
    let mut osc = OscSensor::start(osc_port.unwrap_or(config.osc_port), sensor_tx)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::Relaxed))?;
    log::info!("shake to play, press Ctrl-C to stop");

    if let Err(e) = run_control_loop(&sensor_rx, &running, POLL_INTERVAL, |event| {
        shaker.apply(event);
    }) {
        log::error!("{e}, stopping");
    }

    osc.stop();
    engine.pause()?;
    log::info!("stopped");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Play {
            sound,
            osc_port,
            sweep,
        } => play(cli.config.as_ref(), sound, *osc_port, *sweep),
        Command::Render {
            sound,
            out,
            seconds,
            sweep,
            jitter,
            seed,
        } => render(
            cli.config.as_ref(),
            sound,
            &RenderArgs {
                out,
                seconds: *seconds,
                rps: *sweep,
                jitter: *jitter,
                seed: *seed,
            },
        ),
        Command::Shake {
            osc_port,
            sensitivity,
            sample,
            volume,
        } => shake(
            cli.config.as_ref(),
            *osc_port,
            *sensitivity,
            sample.as_ref(),
            *volume,
        ),
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}
