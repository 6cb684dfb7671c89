//! Change notifications for snapshot readers

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{CommunicatorState, Phase};

/// One committed state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Commit order, strictly increasing
    pub revision: u64,
    /// When it was committed
    pub at: DateTime<Utc>,
    pub state: CommunicatorState,
}

impl StateUpdate {
    pub fn new(revision: u64, state: CommunicatorState) -> Self {
        Self {
            revision,
            at: Utc::now(),
            state,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let phase = self.state.phase();
        format!(
            "{}{} [{}] sanity={:>3} | {} | {}{}",
            phase.color_code(),
            phase.emoji(),
            phase,
            self.state.sanity,
            light(&self.state),
            self.state.status,
            Phase::color_reset()
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "rev={} | phase={} | sanity={} | light={} | status={}",
            self.revision,
            self.state.phase(),
            self.state.sanity,
            if self.state.flashing { "on" } else { "off" },
            self.state.status
        )
    }
}

fn light(state: &CommunicatorState) -> String {
    match (state.flashing, state.active_letter) {
        (_, Some(c)) => format!("[{}]", c),
        (true, None) => "[█]".to_string(),
        (false, None) => "[ ]".to_string(),
    }
}
