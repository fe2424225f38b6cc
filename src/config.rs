//! Configuration: instrument settings loaded from ~/.rotophone/config.yaml.
//!
//! Read-only: the file is never written back. Every field has a default, so a
//! partial file (or no file) is fine.

use std::f64::consts::PI;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::instrument::GateMode;
use crate::motion::DEFAULT_CALIBRATION_OFFSET;
use crate::scale::{IntervalSet, PitchClass, ScaleSpec, ScaleType};
use crate::shaker::DEFAULT_SENSITIVITY;
use crate::synth::{Waveform, MAX_VOLUME, SAMPLE_RATE};

/// Lowest and highest user-facing octave.
pub const OCTAVE_RANGE: (i32, i32) = (1, 7);

/// Allowed sensor update rates in Hz.
pub const MOTION_RATE_RANGE: (f64, f64) = (10.0, 100.0);

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading the file failed.
    Io(io::Error),
    /// The file is not valid YAML for this schema.
    Parse(String),
    /// A value is outside its allowed range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Instrument configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotophoneConfig {
    pub tonic: PitchClass,
    pub scale_type: ScaleType,
    /// Custom semitone offsets; overrides `scale_type` when set.
    pub intervals: Option<Vec<i32>>,
    pub min_octave: i32,
    pub max_octave: i32,
    pub waveform: Waveform,
    /// Linear output level, 0..=32767.
    pub volume: f64,
    pub sound_enabled: bool,
    pub gate_mode: GateMode,
    /// Radians added to the device yaw before quantization.
    pub calibration_offset: f64,
    /// Sensor update rate for simulated sensors, Hz.
    pub motion_update_hz: f64,
    pub sample_rate: u32,
    pub osc_port: u16,
    /// Shaker sensitivity, 0 (hard shakes only) ..= 1 (light taps).
    pub shake_sensitivity: f64,
    /// WAV file the shaker plays; a synthesized burst when unset.
    pub shaker_sample: Option<PathBuf>,
}

impl Default for RotophoneConfig {
    fn default() -> Self {
        Self {
            tonic: PitchClass::C,
            scale_type: ScaleType::MajorPentatonic,
            intervals: None,
            min_octave: 4,
            max_octave: 6,
            waveform: Waveform::Sine,
            volume: MAX_VOLUME,
            sound_enabled: false,
            gate_mode: GateMode::HoldToPlay,
            calibration_offset: DEFAULT_CALIBRATION_OFFSET,
            motion_update_hz: 60.0,
            sample_rate: SAMPLE_RATE,
            osc_port: 9000,
            shake_sensitivity: DEFAULT_SENSITIVITY,
            shaker_sample: None,
        }
    }
}

impl RotophoneConfig {
    /// Standard config path (~/.rotophone/config.yaml).
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".rotophone");
        path.push("config.yaml");
        path
    }

    /// Load from the standard path, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let path = Self::default_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load and validate a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lowest, highest) = OCTAVE_RANGE;
        if self.min_octave < lowest
            || self.min_octave > self.max_octave
            || self.max_octave > highest
        {
            return Err(ConfigError::Invalid(format!(
                "octave range {}..={} must satisfy {lowest} <= min <= max <= {highest}",
                self.min_octave, self.max_octave
            )));
        }
        if let Some(intervals) = &self.intervals {
            IntervalSet::try_new(intervals.clone()).map_err(ConfigError::Invalid)?;
        }
        if !(0.0..=MAX_VOLUME).contains(&self.volume) {
            return Err(ConfigError::Invalid(format!(
                "volume {} outside 0..={MAX_VOLUME}",
                self.volume
            )));
        }
        let (slowest, fastest) = MOTION_RATE_RANGE;
        if !(slowest..=fastest).contains(&self.motion_update_hz) {
            return Err(ConfigError::Invalid(format!(
                "motion_update_hz {} outside {slowest}..={fastest}",
                self.motion_update_hz
            )));
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".into()));
        }
        if !self.calibration_offset.is_finite() || self.calibration_offset.abs() > 4.0 * PI {
            return Err(ConfigError::Invalid(format!(
                "calibration_offset {} must be a finite angle within ±4π",
                self.calibration_offset
            )));
        }
        if !(0.0..=1.0).contains(&self.shake_sensitivity) {
            return Err(ConfigError::Invalid(format!(
                "shake_sensitivity {} outside 0..=1",
                self.shake_sensitivity
            )));
        }
        Ok(())
    }

    /// Scale spec described by this config. Assumes [`validate`](Self::validate) passed.
    pub fn scale_spec(&self) -> ScaleSpec {
        let intervals = match &self.intervals {
            Some(custom) => IntervalSet::new(custom.clone()),
            None => IntervalSet::from(self.scale_type),
        };
        ScaleSpec::new(self.tonic, intervals, self.min_octave, self.max_octave)
    }
}
