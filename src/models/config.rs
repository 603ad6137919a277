use super::session::{DifficultyPreset, GameMode, SessionConfig};
use serde::{Deserialize, Serialize};

/// Application settings from `Manitas Settings.yaml`.
///
/// `session` is the base configuration. When `game_mode` or `difficulty` is set,
/// the preset is applied on top of it (mode first, then difficulty) before the
/// first session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub game_mode: Option<GameMode>,
    pub difficulty: Option<DifficultyPreset>,
    pub session: SessionConfig,

    /// Seed for the question shuffle; random when absent
    pub shuffle_seed: Option<u64>,

    pub debug_mode: bool,
    pub console_log: bool,
    /// Write the log file as JSON lines; console output is off in this mode
    pub json_log: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            game_mode: None,
            difficulty: None,
            session: SessionConfig::default(),
            shuffle_seed: None,
            debug_mode: false,
            console_log: false,
            json_log: false,
        }
    }
}

impl AppSettings {
    /// Session configuration with the selected presets applied.
    pub fn effective_session_config(&self) -> SessionConfig {
        let mut config = self.session.clone();
        if let Some(mode) = self.game_mode {
            mode.apply(&mut config);
        }
        if let Some(difficulty) = self.difficulty {
            difficulty.apply(&mut config);
        }
        config
    }
}
