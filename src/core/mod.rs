//! Core modules for the communicator

pub mod encoder;
pub mod sequencer;
pub mod collaborators;
pub mod communicator;
pub mod api;

pub use encoder::{MorseEncoder, morse_code};
pub use sequencer::LetterSequencer;
pub use collaborators::{ToneSink, Tone, TerminalBell, SilentTone, ShakeDetector};
pub use communicator::{Communicator, TimerStatus};
pub use api::{create_router, run_server, run_server_until};
