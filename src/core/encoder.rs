//! Morse encoder: text → timed pulse/gap sequence
//!
//! International Morse for A-Z and 0-9. Anything else except whitespace is
//! dropped before encoding, so it never separates two letters.

use crate::types::{GapKind, PulseKind, SignalUnit};

/// Code-table entry for an uppercase letter or digit
pub fn morse_code(c: char) -> Option<&'static str> {
    let code = match c {
        'A' => ".-",    'B' => "-...",  'C' => "-.-.",  'D' => "-..",
        'E' => ".",     'F' => "..-.",  'G' => "--.",   'H' => "....",
        'I' => "..",    'J' => ".---",  'K' => "-.-",   'L' => ".-..",
        'M' => "--",    'N' => "-.",    'O' => "---",   'P' => ".--.",
        'Q' => "--.-",  'R' => ".-.",   'S' => "...",   'T' => "-",
        'U' => "..-",   'V' => "...-",  'W' => ".--",   'X' => "-..-",
        'Y' => "-.--",  'Z' => "--..",
        '0' => "-----", '1' => ".----", '2' => "..---", '3' => "...--",
        '4' => "....-", '5' => ".....", '6' => "-....", '7' => "--...",
        '8' => "---..", '9' => "----.",
        _ => return None,
    };
    Some(code)
}

/// Stateless Morse encoder
#[derive(Debug, Default, Clone, Copy)]
pub struct MorseEncoder;

impl MorseEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode text into a pulse/gap sequence. The result never starts or
    /// ends with a gap, and is empty when nothing in `text` is encodable.
    pub fn encode(&self, text: &str) -> Vec<SignalUnit> {
        let clean: Vec<char> = text
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .filter(|&c| c.is_whitespace() || morse_code(c).is_some())
            .collect();

        let mut signals = Vec::new();

        for (index, &ch) in clean.iter().enumerate() {
            if ch.is_whitespace() {
                // Leading whitespace has no word to separate
                if signals.is_empty() {
                    continue;
                }
                if signals.last() == Some(&SignalUnit::LETTER_GAP) {
                    signals.pop();
                }
                signals.push(SignalUnit::gap(GapKind::Word));
                continue;
            }

            let Some(code) = morse_code(ch) else { continue };
            let symbols = code.len();
            for (i, symbol) in code.chars().enumerate() {
                let kind = if symbol == '.' { PulseKind::Dot } else { PulseKind::Dash };
                signals.push(SignalUnit::pulse(kind));
                if i + 1 < symbols {
                    signals.push(SignalUnit::gap(GapKind::Symbol));
                }
            }

            let next_is_letter = clean
                .get(index + 1)
                .is_some_and(|next| !next.is_whitespace());
            if next_is_letter {
                signals.push(SignalUnit::gap(GapKind::Letter));
            }
        }

        while signals.last().is_some_and(SignalUnit::is_gap) {
            signals.pop();
        }

        signals
    }

    /// Total playback time of a sequence in milliseconds
    pub fn calculate_duration(&self, signals: &[SignalUnit]) -> u64 {
        signals.iter().map(SignalUnit::duration_ms).sum()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOT: SignalUnit = SignalUnit::DOT;
    const DASH: SignalUnit = SignalUnit::DASH;
    const SG: SignalUnit = SignalUnit::SYMBOL_GAP;
    const LG: SignalUnit = SignalUnit::LETTER_GAP;
    const WG: SignalUnit = SignalUnit::WORD_GAP;

    #[test]
    fn test_empty_and_unencodable() {
        let enc = MorseEncoder::new();
        assert!(enc.encode("").is_empty());
        assert!(enc.encode("!!!").is_empty());
        assert!(enc.encode("   ").is_empty());
    }

    #[test]
    fn test_sos() {
        let enc = MorseEncoder::new();
        assert_eq!(
            enc.encode("SOS"),
            vec![
                DOT, SG, DOT, SG, DOT, LG,
                DASH, SG, DASH, SG, DASH, LG,
                DOT, SG, DOT, SG, DOT,
            ]
        );
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        let enc = MorseEncoder::new();
        assert_eq!(enc.encode("sos"), enc.encode("SOS"));
    }

    #[test]
    fn test_word_gap_single() {
        let enc = MorseEncoder::new();
        assert_eq!(enc.encode("A B"), vec![DOT, SG, DASH, WG, DASH, SG, DOT, SG, DOT, SG, DOT]);
    }

    #[test]
    fn test_repeated_whitespace_keeps_repeated_word_gaps() {
        let enc = MorseEncoder::new();
        assert_eq!(enc.encode("E  E"), vec![DOT, WG, WG, DOT]);
    }

    #[test]
    fn test_dropped_chars_are_not_boundaries() {
        let enc = MorseEncoder::new();
        assert_eq!(enc.encode("E!T"), enc.encode("ET"));
        assert_eq!(enc.encode("ET"), vec![DOT, LG, DASH]);
    }

    #[test]
    fn test_leading_and_trailing_whitespace_stripped() {
        let enc = MorseEncoder::new();
        assert_eq!(enc.encode("  T  "), vec![DASH]);
    }

    #[test]
    fn test_digits() {
        let enc = MorseEncoder::new();
        assert_eq!(enc.encode("0"), vec![DASH, SG, DASH, SG, DASH, SG, DASH, SG, DASH]);
    }

    #[test]
    fn test_duration() {
        let enc = MorseEncoder::new();
        // 6 dots, 3 dashes, 6 symbol gaps, 2 letter gaps
        let sos = enc.encode("SOS");
        let expected = 6 * 200 + 3 * 600 + 6 * 200 + 2 * 600;
        assert_eq!(enc.calculate_duration(&sos), expected);
        assert_eq!(enc.calculate_duration(&[]), 0);
    }
}
