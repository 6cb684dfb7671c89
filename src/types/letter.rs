//! Letter-at-a-time events

use serde::{Deserialize, Serialize};

/// What a letter event lights up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "char", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LetterChar {
    Letter(char),
    Digit(char),
    /// Word pause, nothing lit
    Space,
}

impl LetterChar {
    /// Character to light, `None` for a pause
    pub fn active(&self) -> Option<char> {
        match *self {
            LetterChar::Letter(c) | LetterChar::Digit(c) => Some(c),
            LetterChar::Space => None,
        }
    }
}

/// One step of letter playback: lit (or paused) for `hold_ms`, then dark for `gap_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterEvent {
    pub ch: LetterChar,
    pub hold_ms: u64,
    pub gap_ms: u64,
}

impl LetterEvent {
    pub fn duration_ms(&self) -> u64 {
        self.hold_ms + self.gap_ms
    }
}
