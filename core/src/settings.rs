use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Difficulty, SettingsError};

/// Engine-wide knobs, loadable from TOML. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Hints granted at the start of every game
    pub hints: u8,
    /// How often a running game's clock is refreshed
    pub tick_interval_ms: u64,
    /// Preset of the game the engine opens with
    pub difficulty: Difficulty,
}

impl EngineSettings {
    pub const DEFAULT_HINTS: u8 = 3;
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hints: Self::DEFAULT_HINTS,
            tick_interval_ms: Self::DEFAULT_TICK_INTERVAL_MS,
            difficulty: Difficulty::Beginner,
        }
    }
}
