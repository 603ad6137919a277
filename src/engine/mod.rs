//! Session state machine.
//!
//! # Overview
//!
//! [`GameEngine`] owns every piece of mutable session state: the [`SessionState`], the
//! [`SelectionPolicy`] and the [`CountdownTimer`]. Collaborators drive it through a small
//! set of commands and observe it through [`GameEvent`]s on its [`EventBus`].
//!
//! ```text
//! NotStarted -> Running <-> Paused
//!                  |
//!                  +-> Completed | GameOver | Stopped
//! ```
//!
//! # Scheduling
//!
//! The engine never spawns anything. Its owner calls [`GameEngine::tick`] periodically
//! (see [`crate::runtime`]); each tick evaluates the countdown and fires the post-answer
//! continuation once its feedback delay has passed. Because all commands and ticks run
//! to completion one at a time, a submission and a timer expiry can never interleave:
//! `submit_answer` stops the clock before reading it, and the expiry path is ignored once
//! an option has been selected.
//!
//! # Invalid commands
//!
//! Commands issued in the wrong phase are ignored with a debug log. The front-end may
//! send stale commands while the session is changing question.

pub mod scoring;

use crate::events::{EventBus, GameEvent};
use crate::metrics::Metrics;
use crate::models::{
    AnswerOutcome, ConfigError, DifficultyPreset, GameMode, GameResult, QuestionRecord,
    SessionConfig, SessionPhase, SessionState,
};
use crate::services::{
    CountdownTimer, QuestionRepository, ScoreStore, SelectionPolicy, TimerEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Deferred advance-or-terminate step scheduled after every scored question.
#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    due: Instant,
    /// Session the continuation belongs to
    epoch: u64,
    /// Delay left when the session was paused
    frozen: Option<Duration>,
}

/// Per-session bookkeeping that is not part of the observable state.
#[derive(Debug, Clone, Default)]
struct SessionStats {
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    questions_answered: u32,
    average_answer_secs: f64,
    lives_bonus: u64,
    time_bonus: u64,
    new_record: bool,
}

impl SessionStats {
    fn record_answer_time(&mut self, secs: f64) {
        self.questions_answered += 1;
        let n = self.questions_answered as f64;
        self.average_answer_secs = (self.average_answer_secs * (n - 1.0) + secs) / n;
    }
}

pub struct GameEngine {
    config: SessionConfig,
    selection: SelectionPolicy,
    timer: CountdownTimer,
    state: SessionState,
    stats: SessionStats,
    pending: Option<PendingTransition>,
    /// Incremented whenever a session starts or stops
    epoch: u64,
    events: EventBus,
    store: Option<Arc<dyn ScoreStore>>,
    metrics: Arc<Metrics>,
}

impl GameEngine {
    /// Create an engine over `repository` with an entropy-seeded draw order.
    ///
    /// # Returns
    /// An error if `config` fails validation
    pub fn new(
        config: SessionConfig,
        repository: Arc<QuestionRepository>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let timer = build_timer(&config);
        Ok(Self {
            state: SessionState::new(&config),
            selection: SelectionPolicy::new(repository),
            timer,
            config,
            stats: SessionStats::default(),
            pending: None,
            epoch: 0,
            events: EventBus::new(),
            store: None,
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Replace the draw order with a reproducible one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        let repository = Arc::clone(self.selection.repository());
        self.selection = SelectionPolicy::with_seed(repository, seed);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ScoreStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Copy of the current session state.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.state.current_question.as_ref()
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// True while the post-answer feedback delay is running.
    pub fn is_awaiting_transition(&self) -> bool {
        self.pending.is_some()
    }

    /// Best score known to the store, 0 without a store or on failure.
    pub fn high_score(&self) -> u64 {
        let Some(store) = &self.store else {
            return 0;
        };
        match store.load_high_score() {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!("Failed to load high score: {}", e);
                self.metrics.record_store_failure();
                0
            }
        }
    }

    /// Wall-clock time since the session started, up to its end if it has ended.
    pub fn elapsed(&self) -> Duration {
        match self.stats.started_at {
            Some(started) => {
                let end = self.stats.ended_at.unwrap_or_else(Instant::now);
                end.saturating_duration_since(started)
            }
            None => Duration::ZERO,
        }
    }

    /// Results so far; final once the session is terminal.
    pub fn get_result(&self) -> GameResult {
        GameResult {
            score: self.state.score,
            correct_answers: self.state.correct_count,
            total_questions: self.state.questions_asked,
            accuracy_percent: self.state.accuracy_percent(),
            best_streak: self.state.best_streak,
            lives_left: self.state.lives,
            total_elapsed_secs: self.elapsed().as_secs_f64(),
            average_answer_time_secs: self.stats.average_answer_secs,
            completed: self.state.phase == SessionPhase::Completed,
            game_over: self.state.phase == SessionPhase::GameOver,
            lives_bonus: self.stats.lives_bonus,
            time_bonus: self.stats.time_bonus,
            new_record: self.stats.new_record,
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Replace the session configuration. Ignored while a session is in progress.
    pub fn set_config(&mut self, config: SessionConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.state.phase.is_in_progress() {
            tracing::debug!("Ignoring configuration change during a session");
            return Ok(());
        }
        self.config = config;
        self.timer = build_timer(&self.config);
        if self.state.phase == SessionPhase::NotStarted {
            self.state = SessionState::new(&self.config);
        }
        Ok(())
    }

    pub fn set_game_mode(&mut self, mode: GameMode) {
        if self.state.phase.is_in_progress() {
            tracing::debug!("Ignoring game mode change during a session");
            return;
        }
        let mut config = self.config.clone();
        mode.apply(&mut config);
        tracing::info!("Game mode set to {}", mode);
        self.apply_preset(config);
    }

    pub fn set_difficulty(&mut self, difficulty: DifficultyPreset) {
        if self.state.phase.is_in_progress() {
            tracing::debug!("Ignoring difficulty change during a session");
            return;
        }
        let mut config = self.config.clone();
        difficulty.apply(&mut config);
        tracing::info!("Difficulty set to {}", difficulty);
        self.apply_preset(config);
    }

    fn apply_preset(&mut self, config: SessionConfig) {
        if let Err(e) = self.set_config(config) {
            tracing::error!("Preset produced an invalid configuration: {}", e);
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a new session. No-op while one is in progress.
    pub fn start(&mut self) {
        if self.state.phase.is_in_progress() {
            tracing::debug!("Ignoring start: session already in progress");
            return;
        }

        self.epoch += 1;
        self.pending = None;
        self.state = SessionState::new(&self.config);
        self.state.phase = SessionPhase::Running;
        self.stats = SessionStats {
            started_at: Some(Instant::now()),
            ..SessionStats::default()
        };
        self.timer.reset(None);
        self.metrics.record_session_started();

        tracing::info!(
            "Session started: {} questions, {}s per question, {} lives",
            self.config.questions_per_game,
            self.config.time_per_question_secs,
            self.config.max_lives
        );
        self.publish(GameEvent::GameStarted(self.state.clone()));

        self.advance_question();
    }

    /// Draw the next question and restart the clock. Only valid while running.
    pub fn advance_question(&mut self) {
        if self.state.phase != SessionPhase::Running {
            tracing::debug!("Ignoring advance: session is {:?}", self.state.phase);
            return;
        }

        let next = self.selection.next().cloned();
        let Some(question) = next else {
            tracing::error!("No question available to advance to, stopping session");
            self.stop();
            return;
        };

        self.state.selected_option = None;
        self.state.questions_asked += 1;
        self.state.current_question = Some(question.clone());

        let seconds = self.config.time_per_question_secs + self.state.time_bonus_level;
        self.timer.reset(Some(Duration::from_secs(seconds as u64)));
        self.timer.start();

        tracing::debug!(
            "Question {} (id {}) with {}s on the clock",
            self.state.questions_asked,
            question.id,
            seconds
        );
        self.publish(GameEvent::QuestionChanged {
            question,
            number: self.state.questions_asked,
            total: self.config.questions_per_game.as_count(),
        });
    }

    /// Record the player's choice. Write-once per question.
    pub fn select_option(&mut self, index: usize) {
        if self.state.phase != SessionPhase::Running || self.pending.is_some() {
            tracing::debug!("Ignoring selection: no question awaiting an answer");
            return;
        }
        if self.state.selected_option.is_some() {
            tracing::debug!("Ignoring selection: option already selected");
            return;
        }
        let valid = self
            .state
            .current_question
            .as_ref()
            .is_some_and(|q| q.is_valid_option(index));
        if !valid {
            tracing::debug!("Ignoring selection: option {} out of range", index);
            return;
        }

        self.state.selected_option = Some(index);
    }

    /// Score the selected option.
    pub fn submit_answer(&mut self) {
        if self.state.phase != SessionPhase::Running || self.pending.is_some() {
            tracing::debug!("Ignoring submit: no question awaiting an answer");
            return;
        }
        let (Some(selected), Some(question)) =
            (self.state.selected_option, self.state.current_question.clone())
        else {
            tracing::debug!("Ignoring submit: nothing selected");
            return;
        };

        // Stop before reading so a concurrent expiry cannot be counted too
        self.timer.stop();
        let time_left = self.timer.remaining();
        let time_taken = self.timer.duration().saturating_sub(time_left);

        let check = self
            .selection
            .repository()
            .check_answer(question.id, selected);
        if !check.found {
            tracing::warn!("Answered question {} is not in the bank", question.id);
        }

        let points_earned = if check.correct {
            self.apply_correct(time_left.as_secs_f64())
        } else {
            self.apply_incorrect();
            0
        };

        self.stats.record_answer_time(time_taken.as_secs_f64());
        self.metrics.record_answer(check.correct, time_taken);

        tracing::debug!(
            "Question {} answered {} in {:.2}s",
            question.id,
            if check.correct { "correctly" } else { "incorrectly" },
            time_taken.as_secs_f64()
        );
        self.publish(GameEvent::AnswerSubmitted(AnswerOutcome {
            question,
            selected: Some(selected),
            correct: check.correct,
            explanation: check.explanation,
            time_taken_secs: time_taken.as_secs_f64(),
            time_left_secs: time_left.as_secs_f64(),
            points_earned,
            timed_out: false,
        }));

        self.schedule_transition();
    }

    /// Select and submit in one step.
    pub fn answer(&mut self, index: usize) {
        self.select_option(index);
        self.submit_answer();
    }

    /// Freeze the clock and any pending transition.
    pub fn pause(&mut self) {
        if !self.state.is_running() {
            tracing::debug!("Ignoring pause: session is {:?}", self.state.phase);
            return;
        }

        if self.pending.is_none() {
            let events = self.timer.pause();
            self.handle_timer_events(events);
        }

        let now = Instant::now();
        if let Some(pending) = self.pending.as_mut() {
            pending.frozen = Some(pending.due.saturating_duration_since(now));
        }

        self.state.phase = SessionPhase::Paused;
        tracing::info!("Session paused");
        self.publish(GameEvent::Paused);
    }

    pub fn resume(&mut self) {
        if !self.state.is_paused() {
            tracing::debug!("Ignoring resume: session is {:?}", self.state.phase);
            return;
        }

        self.state.phase = SessionPhase::Running;
        let now = Instant::now();
        if let Some(pending) = self.pending.as_mut() {
            if let Some(left) = pending.frozen.take() {
                pending.due = now + left;
            }
        } else {
            self.timer.resume();
        }

        tracing::info!("Session resumed");
        self.publish(GameEvent::Resumed);
    }

    /// End an in-progress session early.
    pub fn stop(&mut self) {
        if !self.state.phase.is_in_progress() {
            tracing::debug!("Ignoring stop: no session in progress");
            return;
        }

        self.timer.stop();
        self.epoch += 1;
        self.pending = None;
        self.stats.ended_at = Some(Instant::now());
        self.state.phase = SessionPhase::Stopped;
        self.metrics.record_session_stopped();

        tracing::info!("Session stopped after {} questions", self.state.questions_asked);
        self.finish_session();
    }

    /// Evaluate the clock and fire the pending transition when due.
    pub fn tick(&mut self) {
        if !self.state.is_running() {
            return;
        }

        if let Some(pending) = self.pending {
            if Instant::now() >= pending.due {
                self.fire_transition(pending);
            }
            return;
        }

        let events = self.timer.tick();
        self.handle_timer_events(events);
    }

    // ── Internals ────────────────────────────────────────────────────

    fn handle_timer_events(&mut self, events: Vec<TimerEvent>) {
        for event in events {
            match event {
                TimerEvent::Tick(info) => {
                    self.publish(GameEvent::TimerTick(info));
                }
                TimerEvent::Warning { remaining_seconds } => {
                    self.publish(GameEvent::TimerWarning { remaining_seconds });
                }
                TimerEvent::Complete => {
                    self.publish(GameEvent::TimerComplete);
                    self.on_time_expired();
                }
            }
        }
    }

    /// Treat an unanswered, expired question as an incorrect answer.
    fn on_time_expired(&mut self) {
        if self.state.phase != SessionPhase::Running || self.pending.is_some() {
            return;
        }
        if self.state.selected_option.is_some() {
            tracing::debug!("Time expired with an option selected, awaiting submit");
            return;
        }
        let Some(question) = self.state.current_question.clone() else {
            return;
        };

        let full = self.timer.duration();
        self.apply_incorrect();
        self.stats.record_answer_time(full.as_secs_f64());
        self.metrics.record_timeout();
        self.metrics.record_answer(false, full);

        tracing::debug!("Question {} timed out", question.id);
        let explanation = question.explanation.clone();
        self.publish(GameEvent::TimeExpired {
            question,
            explanation,
        });

        self.schedule_transition();
    }

    fn apply_correct(&mut self, time_left_secs: f64) -> u64 {
        let state = &mut self.state;
        state.correct_count += 1;
        state.streak += 1;
        state.best_streak = state.best_streak.max(state.streak);

        let points = scoring::points_for_correct(
            &self.config,
            state.streak,
            time_left_secs,
            state.combo_multiplier,
        );
        state.time_bonus_level = (state.time_bonus_level + 1).min(self.config.max_time_bonus_level);
        state.score += points;

        let streak = state.streak;
        let total = state.score;
        if scoring::is_streak_milestone(&self.config, streak) {
            self.publish(GameEvent::Streak { count: streak });
        }
        self.publish(GameEvent::ScoreUpdated {
            total,
            earned: points,
        });
        points
    }

    fn apply_incorrect(&mut self) {
        let state = &mut self.state;
        state.incorrect_count += 1;
        state.streak = 0;
        state.combo_multiplier = 1;
        state.time_bonus_level = 0;
        state.lives = state.lives.saturating_sub(1);

        let lives_remaining = state.lives;
        self.publish(GameEvent::LifeLost { lives_remaining });
    }

    fn schedule_transition(&mut self) {
        self.pending = Some(PendingTransition {
            due: Instant::now() + Duration::from_millis(self.config.feedback_delay_ms),
            epoch: self.epoch,
            frozen: None,
        });
    }

    fn fire_transition(&mut self, pending: PendingTransition) {
        self.pending = None;
        if pending.epoch != self.epoch {
            tracing::debug!("Dropping stale transition from an earlier session");
            return;
        }

        if self.state.lives == 0 {
            self.game_over();
        } else if self
            .config
            .questions_per_game
            .is_reached(self.state.questions_asked)
        {
            self.game_completed();
        } else {
            self.advance_question();
        }
    }

    fn game_completed(&mut self) {
        self.timer.stop();
        self.stats.ended_at = Some(Instant::now());

        let lives_bonus = scoring::lives_bonus(&self.config, self.state.lives);
        let time_bonus =
            scoring::completion_time_bonus(&self.config, self.elapsed().as_secs_f64());
        self.stats.lives_bonus = lives_bonus;
        self.stats.time_bonus = time_bonus;
        self.state.score += lives_bonus + time_bonus;

        self.state.phase = SessionPhase::Completed;
        self.metrics.record_session_completed();
        tracing::info!(
            "Session completed: score {} (lives bonus {}, time bonus {})",
            self.state.score,
            lives_bonus,
            time_bonus
        );
        self.finish_session();
    }

    fn game_over(&mut self) {
        self.timer.stop();
        self.stats.ended_at = Some(Instant::now());
        self.state.phase = SessionPhase::GameOver;
        self.metrics.record_game_over();
        tracing::info!("Game over: score {}", self.state.score);
        self.finish_session();
    }

    /// Persist the outcome and notify observers. Store failures are only logged.
    ///
    /// Every ended session is recorded in the game history, but only a completed one
    /// is offered as a high score.
    fn finish_session(&mut self) {
        self.pending = None;

        if let Some(store) = self.store.clone() {
            if self.state.phase == SessionPhase::Completed {
                match store.update_high_score(self.state.score) {
                    Ok(is_new) => self.stats.new_record = is_new,
                    Err(e) => {
                        tracing::warn!("Failed to update high score: {}", e);
                        self.metrics.record_store_failure();
                    }
                }
            }

            if let Err(e) = store.record_completed_game(
                self.state.correct_count,
                self.state.questions_asked,
                self.elapsed().as_secs_f64(),
            ) {
                tracing::warn!("Failed to record game: {}", e);
                self.metrics.record_store_failure();
            }
        }

        let result = self.get_result();
        self.publish(GameEvent::GameEnded(result));
    }

    fn publish(&self, event: GameEvent) {
        let delivered = self.events.publish(event);
        self.metrics.record_event(delivered);
    }
}

fn build_timer(config: &SessionConfig) -> CountdownTimer {
    CountdownTimer::new(Duration::from_secs(config.time_per_question_secs as u64))
        .with_warning_threshold(Duration::from_secs(config.warning_threshold_secs as u64))
        .with_update_interval(Duration::from_millis(config.tick_interval_ms))
}
