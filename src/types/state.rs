//! Communicator state definitions

use serde::{Deserialize, Serialize};
use crate::SANITY_MAX;
use crate::types::{SignalUnit, StatusLabel};

/// The three phases a communicator can be in, derived from state fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Waiting for a message
    Idle,
    /// Playing a sequence back
    Transmitting,
    /// Sanity hit zero, locked out until restored
    Possessed,
}

impl Phase {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            Phase::Idle => "\x1b[32m",         // Phosphor green
            Phase::Transmitting => "\x1b[92m", // Bright green
            Phase::Possessed => "\x1b[31m",    // Corruption red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Phase::Idle => "📟",
            Phase::Transmitting => "💡",
            Phase::Possessed => "👁",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "IDLE",
            Phase::Transmitting => "TRANSMITTING",
            Phase::Possessed => "POSSESSED",
        };
        write!(f, "{}", name)
    }
}

/// Which playback variant a transmission uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransmitMode {
    /// Dot/dash pulses
    #[default]
    Morse,
    /// One lit letter at a time
    Letters,
}

/// Live communicator state, as seen by readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicatorState {
    /// 0..=100, drains by one per tick
    pub sanity: u8,
    /// True from sanity hitting zero until restored
    pub possessed: bool,
    /// User-edited text, not sent until submitted
    pub message: String,
    pub transmitting: bool,
    /// Light currently on
    pub flashing: bool,
    /// Letter currently lit (letter mode)
    pub active_letter: Option<char>,
    pub status: StatusLabel,
    /// Last encoded Morse sequence
    pub signal_output: Vec<SignalUnit>,
    pub mode: TransmitMode,
    /// Times possession has been entered this session
    pub possessions: u64,
}

impl CommunicatorState {
    pub fn new(mode: TransmitMode) -> Self {
        Self {
            sanity: SANITY_MAX,
            possessed: false,
            message: String::new(),
            transmitting: false,
            flashing: false,
            active_letter: None,
            status: StatusLabel::Ready,
            signal_output: Vec::new(),
            mode,
            possessions: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.possessed {
            Phase::Possessed
        } else if self.transmitting {
            Phase::Transmitting
        } else {
            Phase::Idle
        }
    }

    /// Check the state invariants: possession implies zero sanity and no
    /// transmission, and the light is only ever on while transmitting.
    pub fn is_consistent(&self) -> bool {
        let possession_ok = !self.possessed || (self.sanity == 0 && !self.transmitting);
        let flash_ok = !self.flashing || self.transmitting;
        let letter_ok = self.active_letter.is_none() || self.transmitting;
        possession_ok && flash_ok && letter_ok && self.sanity <= SANITY_MAX
    }
}

impl Default for CommunicatorState {
    fn default() -> Self {
        Self::new(TransmitMode::default())
    }
}
