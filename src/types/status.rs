//! Status line shown under the signal display

use serde::{Deserialize, Serialize};
use crate::{SANITY_CRITICAL, SANITY_INTERFERENCE};

/// Informational status label, always derived from the other state fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLabel {
    /// Idle with healthy sanity
    Ready,
    /// Playback in progress
    Transmitting,
    /// Playback just finished
    Complete,
    /// Sanity at or below 50
    Interference,
    /// Sanity at or below 20
    Critical,
    /// Possessed
    Corrupted,
}

impl StatusLabel {
    /// Derive the label. Possession outranks everything, then transmission
    /// statuses, then the drain thresholds (most severe first).
    pub fn derive(sanity: u8, possessed: bool, transmitting: bool, completing: bool) -> Self {
        if possessed || sanity == 0 {
            Self::Corrupted
        } else if transmitting {
            Self::Transmitting
        } else if completing {
            Self::Complete
        } else {
            Self::from_sanity(sanity)
        }
    }

    /// Drain-derived label alone
    pub fn from_sanity(sanity: u8) -> Self {
        match sanity {
            0 => Self::Corrupted,
            s if s <= SANITY_CRITICAL => Self::Critical,
            s if s <= SANITY_INTERFERENCE => Self::Interference,
            _ => Self::Ready,
        }
    }

    /// Text as shown on the terminal
    pub fn text(&self) -> &'static str {
        match self {
            Self::Ready => "SIGNAL READY",
            Self::Transmitting => "TRANSMITTING...",
            Self::Complete => "TRANSMISSION COMPLETE",
            Self::Interference => "INTERFERENCE DETECTED",
            Self::Critical => "SYSTEM CRITICAL",
            Self::Corrupted => "SYSTEM CORRUPTED",
        }
    }
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_most_severe_wins() {
        assert_eq!(StatusLabel::from_sanity(100), StatusLabel::Ready);
        assert_eq!(StatusLabel::from_sanity(51), StatusLabel::Ready);
        assert_eq!(StatusLabel::from_sanity(50), StatusLabel::Interference);
        assert_eq!(StatusLabel::from_sanity(21), StatusLabel::Interference);
        assert_eq!(StatusLabel::from_sanity(20), StatusLabel::Critical);
        assert_eq!(StatusLabel::from_sanity(1), StatusLabel::Critical);
        assert_eq!(StatusLabel::from_sanity(0), StatusLabel::Corrupted);
    }

    #[test]
    fn test_transmission_outranks_drain() {
        assert_eq!(StatusLabel::derive(15, false, true, false), StatusLabel::Transmitting);
        assert_eq!(StatusLabel::derive(15, false, false, true), StatusLabel::Complete);
        assert_eq!(StatusLabel::derive(15, false, false, false), StatusLabel::Critical);
    }

    #[test]
    fn test_possession_outranks_all() {
        assert_eq!(StatusLabel::derive(0, true, true, true), StatusLabel::Corrupted);
    }
}
