//! Upside Down Communicator: a corrupted terminal that blinks messages in Morse
//!
//! text → encoder/sequencer → Communicator playback → tone sink + snapshot readers

pub mod config;
pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// SIGNAL TIMING - milliseconds per unit
// =============================================================================

/// Short flash
pub const DOT_MS: u64 = 200;

/// Long flash
pub const DASH_MS: u64 = 600;

/// Silence between symbols of the same letter
pub const SYMBOL_GAP_MS: u64 = 200;

/// Silence between letters
pub const LETTER_GAP_MS: u64 = 600;

/// Silence between words
pub const WORD_GAP_MS: u64 = 1400;

// =============================================================================
// LETTER MODE TIMING
// =============================================================================

/// How long a letter stays lit
pub const LETTER_HOLD_MS: u64 = 600;

/// Dark settle after each lit letter
pub const LETTER_SETTLE_MS: u64 = 300;

/// Pause for a whitespace run
pub const WORD_PAUSE_MS: u64 = 800;

// =============================================================================
// SANITY
// =============================================================================

/// Starting (and restored) sanity
pub const SANITY_MAX: u8 = 100;

/// Sanity at or below this reads SYSTEM CRITICAL
pub const SANITY_CRITICAL: u8 = 20;

/// Sanity at or below this reads INTERFERENCE DETECTED
pub const SANITY_INTERFERENCE: u8 = 50;

/// One sanity point drains per interval
pub const SANITY_DRAIN_INTERVAL_MS: u64 = 1000;

/// Possession clears on its own after this long
pub const POSSESSION_DURATION_MS: u64 = 30_000;

/// How long TRANSMISSION COMPLETE stays up
pub const COMPLETE_HOLD_MS: u64 = 2000;

/// Minimum time between two accepted shakes
pub const SHAKE_COOLDOWN_MS: u64 = 500;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
