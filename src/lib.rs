// MANITAS - timed hand-hygiene and workplace-safety trivia quiz
//
// This is the library crate containing the session engine and its collaborators.
// The binary crate (main.rs) provides the terminal front-end.

pub mod config;
pub mod engine;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod runtime;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use engine::GameEngine;
pub use events::{EventBus, GameEvent};
pub use metrics::Metrics;
pub use models::{
    AppSettings, DifficultyPreset, GameMode, GameResult, QuestionLimit, QuestionRecord,
    SessionConfig, SessionPhase, SessionState,
};
pub use runtime::{SessionHandle, SessionRuntime};
pub use services::{QuestionRepository, ScoreStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
