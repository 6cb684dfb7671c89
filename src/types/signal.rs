//! Morse signal primitives

use serde::{Deserialize, Serialize};
use crate::{DOT_MS, DASH_MS, SYMBOL_GAP_MS, LETTER_GAP_MS, WORD_GAP_MS};

/// Light-on element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PulseKind {
    Dot,
    Dash,
}

/// Silent interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapKind {
    /// Between symbols of one letter
    Symbol,
    /// Between letters of one word
    Letter,
    /// Between words
    Word,
}

/// One timed unit of an encoded transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalUnit {
    Pulse { kind: PulseKind, duration_ms: u64 },
    Gap { kind: GapKind, duration_ms: u64 },
}

impl SignalUnit {
    pub const DOT: SignalUnit = SignalUnit::Pulse { kind: PulseKind::Dot, duration_ms: DOT_MS };
    pub const DASH: SignalUnit = SignalUnit::Pulse { kind: PulseKind::Dash, duration_ms: DASH_MS };
    pub const SYMBOL_GAP: SignalUnit = SignalUnit::Gap { kind: GapKind::Symbol, duration_ms: SYMBOL_GAP_MS };
    pub const LETTER_GAP: SignalUnit = SignalUnit::Gap { kind: GapKind::Letter, duration_ms: LETTER_GAP_MS };
    pub const WORD_GAP: SignalUnit = SignalUnit::Gap { kind: GapKind::Word, duration_ms: WORD_GAP_MS };

    /// Pulse of the given kind at its fixed duration
    pub fn pulse(kind: PulseKind) -> Self {
        match kind {
            PulseKind::Dot => Self::DOT,
            PulseKind::Dash => Self::DASH,
        }
    }

    /// Gap of the given kind at its fixed duration
    pub fn gap(kind: GapKind) -> Self {
        match kind {
            GapKind::Symbol => Self::SYMBOL_GAP,
            GapKind::Letter => Self::LETTER_GAP,
            GapKind::Word => Self::WORD_GAP,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match *self {
            SignalUnit::Pulse { duration_ms, .. } | SignalUnit::Gap { duration_ms, .. } => duration_ms,
        }
    }

    pub fn is_pulse(&self) -> bool {
        matches!(self, SignalUnit::Pulse { .. })
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, SignalUnit::Gap { .. })
    }

    /// Render as dot/dash notation: `.` `-` for pulses, `` `` `/` for gaps
    pub fn glyph(&self) -> &'static str {
        match self {
            SignalUnit::Pulse { kind: PulseKind::Dot, .. } => ".",
            SignalUnit::Pulse { kind: PulseKind::Dash, .. } => "-",
            SignalUnit::Gap { kind: GapKind::Symbol, .. } => "",
            SignalUnit::Gap { kind: GapKind::Letter, .. } => " ",
            SignalUnit::Gap { kind: GapKind::Word, .. } => " / ",
        }
    }
}

/// Dot/dash notation for a whole sequence, e.g. `... --- ...`
pub fn notation(units: &[SignalUnit]) -> String {
    units.iter().map(SignalUnit::glyph).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_durations() {
        assert_eq!(SignalUnit::DOT.duration_ms(), 200);
        assert_eq!(SignalUnit::DASH.duration_ms(), 600);
        assert_eq!(SignalUnit::SYMBOL_GAP.duration_ms(), 200);
        assert_eq!(SignalUnit::LETTER_GAP.duration_ms(), 600);
        assert_eq!(SignalUnit::WORD_GAP.duration_ms(), 1400);
    }

    #[test]
    fn test_notation() {
        let units = [
            SignalUnit::DOT,
            SignalUnit::SYMBOL_GAP,
            SignalUnit::DASH,
            SignalUnit::WORD_GAP,
            SignalUnit::DASH,
        ];
        assert_eq!(notation(&units), ".- / -");
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_string(&SignalUnit::DOT).unwrap();
        assert_eq!(json, r#"{"type":"PULSE","kind":"DOT","duration_ms":200}"#);
    }
}
