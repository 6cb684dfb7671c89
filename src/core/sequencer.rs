//! Letter sequencer: text → one lit letter at a time

use crate::{LETTER_HOLD_MS, LETTER_SETTLE_MS, WORD_PAUSE_MS};
use crate::types::{LetterChar, LetterEvent};

#[derive(Debug, Default, Clone, Copy)]
pub struct LetterSequencer;

impl LetterSequencer {
    pub fn new() -> Self {
        Self
    }

    /// Each letter or digit lights for the hold time then settles dark;
    /// a whitespace run becomes a single pause. Other characters are dropped.
    pub fn sequence(&self, text: &str) -> Vec<LetterEvent> {
        let mut events: Vec<LetterEvent> = Vec::new();

        for c in text.chars().flat_map(char::to_uppercase) {
            let ch = if c.is_whitespace() {
                if events.last().is_some_and(|e| e.ch == LetterChar::Space) {
                    continue;
                }
                LetterChar::Space
            } else if c.is_alphabetic() {
                LetterChar::Letter(c)
            } else if c.is_ascii_digit() {
                LetterChar::Digit(c)
            } else {
                continue;
            };

            events.push(match ch {
                LetterChar::Space => LetterEvent { ch, hold_ms: WORD_PAUSE_MS, gap_ms: 0 },
                _ => LetterEvent { ch, hold_ms: LETTER_HOLD_MS, gap_ms: LETTER_SETTLE_MS },
            });
        }

        events
    }

    pub fn calculate_duration(&self, events: &[LetterEvent]) -> u64 {
        events.iter().map(LetterEvent::duration_ms).sum()
    }
}
