//! Runtime configuration
//!
//! Defaults mirror the crate constants. A JSON file may override any subset.

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::{
    SANITY_DRAIN_INTERVAL_MS, POSSESSION_DURATION_MS, COMPLETE_HOLD_MS,
    SHAKE_COOLDOWN_MS,
};
use crate::error::{CommunicatorError, Result};
use crate::types::TransmitMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicatorConfig {
    /// Period of the sanity drain
    pub drain_interval_ms: u64,
    /// Auto-recovery delay once possessed
    pub possession_duration_ms: u64,
    /// How long TRANSMISSION COMPLETE is shown
    pub complete_hold_ms: u64,
    /// Shake debounce window
    pub shake_cooldown_ms: u64,
    pub mode: TransmitMode,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            drain_interval_ms: SANITY_DRAIN_INTERVAL_MS,
            possession_duration_ms: POSSESSION_DURATION_MS,
            complete_hold_ms: COMPLETE_HOLD_MS,
            shake_cooldown_ms: SHAKE_COOLDOWN_MS,
            mode: TransmitMode::Morse,
        }
    }
}

impl CommunicatorConfig {
    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CommunicatorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| CommunicatorError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("drain_interval_ms", self.drain_interval_ms),
            ("possession_duration_ms", self.possession_duration_ms),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(CommunicatorError::ConfigValue {
                    field,
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    pub fn possession_duration(&self) -> Duration {
        Duration::from_millis(self.possession_duration_ms)
    }

    pub fn complete_hold(&self) -> Duration {
        Duration::from_millis(self.complete_hold_ms)
    }

    pub fn shake_cooldown(&self) -> Duration {
        Duration::from_millis(self.shake_cooldown_ms)
    }
}
