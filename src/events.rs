// Session notifications
//
// The engine publishes GameEvents on a broadcast channel. Any number of observers
// (the terminal front-end, tests, loggers) can subscribe; none of them can mutate
// the session except by sending commands.

use crate::models::{AnswerOutcome, GameResult, QuestionRecord, SessionState};
use crate::services::TickInfo;
use tokio::sync::broadcast;

/// Buffer size of the event channel. Slow subscribers lag instead of blocking the engine.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Notifications emitted by the [`GameEngine`](crate::engine::GameEngine)
///
/// Every payload is an owned snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A session has started; carries the freshly reset state
    GameStarted(SessionState),

    /// A new question is on screen
    QuestionChanged {
        question: QuestionRecord,
        /// 1-based position within the session
        number: u32,
        /// `None` for unbounded sessions
        total: Option<u32>,
    },

    /// An answer was scored (manual submission or timeout)
    AnswerSubmitted(AnswerOutcome),

    /// The clock ran out with nothing selected
    TimeExpired {
        question: QuestionRecord,
        explanation: String,
    },

    /// The streak reached a multiple of the streak threshold
    Streak { count: u32 },

    LifeLost { lives_remaining: u32 },

    ScoreUpdated { total: u64, earned: u64 },

    TimerTick(TickInfo),

    TimerWarning { remaining_seconds: u64 },

    TimerComplete,

    Paused,

    Resumed,

    /// The session reached a terminal phase
    GameEnded(GameResult),
}

impl GameEvent {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::GameStarted(_) => "game_started",
            GameEvent::QuestionChanged { .. } => "question_changed",
            GameEvent::AnswerSubmitted(_) => "answer_submitted",
            GameEvent::TimeExpired { .. } => "time_expired",
            GameEvent::Streak { .. } => "streak",
            GameEvent::LifeLost { .. } => "life_lost",
            GameEvent::ScoreUpdated { .. } => "score_updated",
            GameEvent::TimerTick(_) => "timer_tick",
            GameEvent::TimerWarning { .. } => "timer_warning",
            GameEvent::TimerComplete => "timer_complete",
            GameEvent::Paused => "paused",
            GameEvent::Resumed => "resumed",
            GameEvent::GameEnded(_) => "game_ended",
        }
    }
}

/// Broadcast channel for [`GameEvent`]s
///
/// Cloning the bus shares the same channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event
    ///
    /// # Returns
    /// `true` if at least one subscriber received it. Nobody listening is not an error.
    pub fn publish(&self, event: GameEvent) -> bool {
        tracing::trace!("Publishing {}", event.kind());
        self.tx.send(event).is_ok()
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
