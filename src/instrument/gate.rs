//! Play gate: decides whether the tone is audible.

use serde::{Deserialize, Serialize};

/// How the play gesture maps to sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateMode {
    /// Sound only while the gesture is held.
    #[default]
    HoldToPlay,
    /// Sound unless the gesture is held.
    TapToMute,
}

impl GateMode {
    pub fn inverted(self) -> bool {
        matches!(self, GateMode::TapToMute)
    }
}

/// Enabled flag, gesture state and mode combined into a single audible/silent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayGate {
    pub enabled: bool,
    pub pressed: bool,
    pub mode: GateMode,
}

impl PlayGate {
    pub fn new(enabled: bool, mode: GateMode) -> Self {
        Self {
            enabled,
            pressed: false,
            mode,
        }
    }

    /// `enabled AND (pressed XOR inverted)`.
    pub fn is_open(&self) -> bool {
        self.enabled && (self.pressed ^ self.mode.inverted())
    }
}
