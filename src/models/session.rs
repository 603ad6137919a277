use super::question::QuestionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How many questions a session asks before it completes.
///
/// Survival mode uses [`QuestionLimit::Unbounded`], which never satisfies the
/// completion check; such sessions only end by running out of lives or being stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionLimitRepr", into = "QuestionLimitRepr")]
pub enum QuestionLimit {
    Bounded(u32),
    Unbounded,
}

impl QuestionLimit {
    /// Returns true once `asked` questions satisfy the limit.
    pub fn is_reached(&self, asked: u32) -> bool {
        match self {
            QuestionLimit::Bounded(limit) => asked >= *limit,
            QuestionLimit::Unbounded => false,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            QuestionLimit::Bounded(limit) => Some(*limit),
            QuestionLimit::Unbounded => None,
        }
    }
}

impl fmt::Display for QuestionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionLimit::Bounded(limit) => write!(f, "{}", limit),
            QuestionLimit::Unbounded => write!(f, "∞"),
        }
    }
}

/// On-disk form: either a plain count or the keyword `unbounded`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum QuestionLimitRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<QuestionLimitRepr> for QuestionLimit {
    type Error = String;

    fn try_from(repr: QuestionLimitRepr) -> Result<Self, Self::Error> {
        match repr {
            QuestionLimitRepr::Count(count) => Ok(QuestionLimit::Bounded(count)),
            QuestionLimitRepr::Keyword(word) => {
                let word = word.trim();
                if word.eq_ignore_ascii_case("unbounded") || word.eq_ignore_ascii_case("infinite") {
                    Ok(QuestionLimit::Unbounded)
                } else {
                    word.parse::<u32>()
                        .map(QuestionLimit::Bounded)
                        .map_err(|_| format!("invalid question limit: {}", word))
                }
            }
        }
    }
}

impl From<QuestionLimit> for QuestionLimitRepr {
    fn from(limit: QuestionLimit) -> Self {
        match limit {
            QuestionLimit::Bounded(count) => QuestionLimitRepr::Count(count),
            QuestionLimit::Unbounded => QuestionLimitRepr::Keyword("unbounded".to_string()),
        }
    }
}

/// Invalid session configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Time per question must be greater than zero")]
    ZeroQuestionTime,

    #[error("Question count must be greater than zero")]
    ZeroQuestionCount,

    #[error("Maximum lives must be greater than zero")]
    ZeroLives,

    #[error("Streak threshold must be greater than zero")]
    ZeroStreakThreshold,

    #[error("Tick interval must be greater than zero")]
    ZeroTickInterval,
}

/// Immutable per-session tuning.
///
/// Defaults match the "normal" game mode at "medium" difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub questions_per_game: QuestionLimit,
    pub time_per_question_secs: u32,
    /// Consecutive correct answers needed before the streak bonus applies
    pub streak_threshold: u32,
    pub points_per_correct: u64,
    pub points_per_time_bonus_unit: u64,
    pub points_per_streak_unit: u64,
    pub max_streak_bonus_multiple: u64,
    pub max_lives: u32,
    pub lives_bonus_points: u64,
    /// Completion bonus is `time_budget_secs - total elapsed seconds`, floored at zero
    pub time_budget_secs: u64,
    /// Pause between answer feedback and the next question
    pub feedback_delay_ms: u64,
    pub warning_threshold_secs: u32,
    pub tick_interval_ms: u64,
    pub max_time_bonus_level: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            questions_per_game: QuestionLimit::Bounded(15),
            time_per_question_secs: 20,
            streak_threshold: 3,
            points_per_correct: 100,
            points_per_time_bonus_unit: 10,
            points_per_streak_unit: 50,
            max_streak_bonus_multiple: 5,
            max_lives: 3,
            lives_bonus_points: 500,
            time_budget_secs: 1000,
            feedback_delay_ms: 1500,
            warning_threshold_secs: 5,
            tick_interval_ms: 100,
            max_time_bonus_level: 5,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_per_question_secs == 0 {
            return Err(ConfigError::ZeroQuestionTime);
        }
        if self.questions_per_game == QuestionLimit::Bounded(0) {
            return Err(ConfigError::ZeroQuestionCount);
        }
        if self.max_lives == 0 {
            return Err(ConfigError::ZeroLives);
        }
        if self.streak_threshold == 0 {
            return Err(ConfigError::ZeroStreakThreshold);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }
}

/// Game mode presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Normal,
    TimeAttack,
    Survival,
}

impl GameMode {
    /// Overwrite the mode-controlled fields of `config`.
    pub fn apply(&self, config: &mut SessionConfig) {
        let (time, questions, lives) = match self {
            GameMode::Normal => (20, QuestionLimit::Bounded(15), 3),
            GameMode::TimeAttack => (15, QuestionLimit::Bounded(20), 1),
            GameMode::Survival => (25, QuestionLimit::Unbounded, 1),
        };
        config.time_per_question_secs = time;
        config.questions_per_game = questions;
        config.max_lives = lives;
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Normal => "normal",
            GameMode::TimeAttack => "time attack",
            GameMode::Survival => "survival",
        };
        f.write_str(name)
    }
}

/// Difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl DifficultyPreset {
    /// Overwrite the difficulty-controlled fields of `config`.
    pub fn apply(&self, config: &mut SessionConfig) {
        let (time, points) = match self {
            DifficultyPreset::Easy => (30, 50),
            DifficultyPreset::Medium => (20, 100),
            DifficultyPreset::Hard => (15, 150),
        };
        config.time_per_question_secs = time;
        config.points_per_correct = points;
    }
}

impl fmt::Display for DifficultyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DifficultyPreset::Easy => "easy",
            DifficultyPreset::Medium => "medium",
            DifficultyPreset::Hard => "hard",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a session.
///
/// ```text
/// NotStarted -> Running <-> Paused -> Completed | GameOver | Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    Running,
    Paused,
    Completed,
    GameOver,
    Stopped,
}

impl SessionPhase {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, SessionPhase::Running | SessionPhase::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Completed | SessionPhase::GameOver | SessionPhase::Stopped
        )
    }
}

/// Mutable state of a session, owned by the [`GameEngine`](crate::engine::GameEngine).
///
/// Observers only ever see clones of this struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub current_question: Option<QuestionRecord>,
    pub selected_option: Option<usize>,
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub lives: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub questions_asked: u32,
    /// Reserved multiplier, always 1 for now
    pub combo_multiplier: u64,
    /// Recent fast-correct answers; each level adds one second to the next question
    pub time_bonus_level: u32,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            current_question: None,
            selected_option: None,
            score: 0,
            streak: 0,
            best_streak: 0,
            lives: config.max_lives,
            correct_count: 0,
            incorrect_count: 0,
            questions_asked: 0,
            combo_multiplier: 1,
            time_bonus_level: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == SessionPhase::Paused
    }

    /// Percentage of asked questions answered correctly.
    pub fn accuracy_percent(&self) -> f64 {
        if self.questions_asked == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.questions_asked as f64 * 100.0
        }
    }
}

/// Result of one answered (or timed-out) question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub question: QuestionRecord,
    pub selected: Option<usize>,
    pub correct: bool,
    pub explanation: String,
    pub time_taken_secs: f64,
    pub time_left_secs: f64,
    pub points_earned: u64,
    pub timed_out: bool,
}

/// Final (or in-progress) snapshot of a session's results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    pub score: u64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub accuracy_percent: f64,
    pub best_streak: u32,
    pub lives_left: u32,
    pub total_elapsed_secs: f64,
    pub average_answer_time_secs: f64,
    pub completed: bool,
    pub game_over: bool,
    pub lives_bonus: u64,
    pub time_bonus: u64,
    pub new_record: bool,
}

impl GameResult {
    /// Elapsed time formatted as `M:SS`.
    pub fn formatted_elapsed(&self) -> String {
        let total = self.total_elapsed_secs.max(0.0) as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }
}
