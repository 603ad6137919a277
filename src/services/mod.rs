//! Services module - the collaborators the session engine is composed from.
//!
//! Every service here is framework-agnostic and owns its own state; none of them
//! knows about the engine, the event bus or the terminal front-end.
//!
//! # Components
//!
//! - [`QuestionRepository`]: The validated, read-only question bank. Provides:
//!   - Lookups by id, category and difficulty
//!   - Random draws and bank statistics
//!   - Answer checks that report unknown ids as a lookup miss
//!
//! - [`SelectionPolicy`]: A non-repeating draw order over the repository that
//!   reshuffles once every question has been asked.
//!
//! - [`CountdownTimer`]: The per-question clock. It never runs on its own; the owner
//!   ticks it and receives [`TimerEvent`]s back.
//!
//! - [`ScoreStore`]: The persistence contract for high scores and game history, with
//!   a YAML-file implementation and an in-memory one.
//!
//! # Usage Example
//!
//! ```ignore
//! use manitas::services::{QuestionRepository, SelectionPolicy};
//! use std::sync::Arc;
//!
//! let repository = Arc::new(QuestionRepository::builtin()?);
//! let mut policy = SelectionPolicy::new(repository);
//! let question = policy.next();
//! ```

pub mod repository;
pub mod selection;
pub mod storage;
pub mod timer;

pub use repository::{AnswerCheck, QUESTION_NOT_FOUND, QuestionRepository, RepositoryError, RepositoryStats};
pub use selection::SelectionPolicy;
pub use storage::{MemoryScoreStore, ProgressRecord, ScoreStore, StorageError, YamlScoreStore};
pub use timer::{CountdownTimer, TickInfo, TimerEvent, TimerPhase, format_time};
