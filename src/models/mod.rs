//! Data models for the MANITAS quiz.
//!
//! This module contains the core data structures shared by the engine and its collaborators:
//! - [`QuestionRecord`]: An immutable multiple-choice question from the question bank
//! - [`SessionConfig`]: Per-session tuning (durations, point values, lives)
//! - [`SessionState`]: The mutable state of a running session, owned by the engine
//! - [`GameResult`]: The snapshot handed to observers when a session ends
//! - [`AppSettings`]: Settings loaded from `Manitas Settings.yaml`
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: Config structs derive `Serialize`/`Deserialize` for YAML persistence
//! - **Cloneable**: Observers receive clones, never references into engine state
//! - **Owned**: [`SessionState`] is only mutated by [`GameEngine`](crate::engine::GameEngine) methods

pub mod config;
pub mod question;
pub mod session;

pub use config::AppSettings;
pub use question::{OPTION_COUNT, QuestionDraft, QuestionRecord};
pub use session::{
    AnswerOutcome, ConfigError, DifficultyPreset, GameMode, GameResult, QuestionLimit,
    SessionConfig, SessionPhase, SessionState,
};
