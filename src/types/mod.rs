//! Core types for the communicator

mod signal;
mod letter;
mod state;
mod status;
mod output;

pub use signal::{SignalUnit, PulseKind, GapKind, notation};
pub use letter::{LetterEvent, LetterChar};
pub use state::{CommunicatorState, Phase, TransmitMode};
pub use status::StatusLabel;
pub use output::StateUpdate;
