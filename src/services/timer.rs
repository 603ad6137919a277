//! Per-question countdown timer.
//!
//! The timer is a wall-clock-delta state machine with no task or thread of its own.
//! The owner calls [`CountdownTimer::tick`] periodically; each evaluation subtracts the
//! real time elapsed since the previous one, so slow or skipped ticks self-correct.
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            +-> Expired | Stopped
//! ```
//!
//! Notifications are returned from the call that produced them instead of being
//! pushed through callbacks; a timer that is not running never produces any.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_DURATION_SECS: u64 = 20;
pub const DEFAULT_WARNING_THRESHOLD_SECS: u64 = 5;
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Expired,
    Stopped,
}

/// Display data carried by every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickInfo {
    /// Whole seconds left, rounded up
    pub remaining_seconds: u64,
    /// Share of the duration still left, 100 at start and 0 at expiry
    pub progress_percent: f64,
    /// `MM:SS`
    pub formatted_time: String,
    pub remaining: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TimerEvent {
    Tick(TickInfo),
    /// Fired once per run when the remaining time first drops to the threshold
    Warning { remaining_seconds: u64 },
    /// Fired exactly once, when remaining time reaches zero
    Complete,
}

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    duration: Duration,
    remaining: Duration,
    phase: TimerPhase,
    warning_threshold: Duration,
    update_interval: Duration,
    /// Instant of the last evaluation; `None` whenever the timer is not running
    last_eval: Option<Instant>,
    started_at: Option<Instant>,
    warned: bool,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_DURATION_SECS))
    }
}

impl CountdownTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: duration,
            phase: TimerPhase::Idle,
            warning_threshold: Duration::from_secs(DEFAULT_WARNING_THRESHOLD_SECS),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            last_eval: None,
            started_at: None,
            warned: false,
        }
    }

    pub fn with_warning_threshold(mut self, threshold: Duration) -> Self {
        self.warning_threshold = threshold;
        self
    }

    /// Minimum wall-clock time between two evaluations.
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// Wall-clock time since the last `start()`, including paused time.
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| Instant::now().saturating_duration_since(started))
            .unwrap_or_default()
    }

    /// Share of the duration already consumed, 0 to 100.
    pub fn progress_percent_completed(&self) -> f64 {
        if self.duration.is_zero() {
            return 100.0;
        }
        let used = self.duration.saturating_sub(self.remaining);
        used.as_secs_f64() / self.duration.as_secs_f64() * 100.0
    }

    pub fn tick_info(&self) -> TickInfo {
        let remaining_seconds = ceil_secs(self.remaining);
        let progress_percent = if self.duration.is_zero() {
            0.0
        } else {
            self.remaining.as_secs_f64() / self.duration.as_secs_f64() * 100.0
        };
        TickInfo {
            remaining_seconds,
            progress_percent,
            formatted_time: format_time(remaining_seconds),
            remaining: self.remaining,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down from the full duration. No-op while already running.
    pub fn start(&mut self) {
        if self.phase == TimerPhase::Running {
            return;
        }
        let now = Instant::now();
        self.remaining = self.duration;
        self.warned = false;
        self.phase = TimerPhase::Running;
        self.started_at = Some(now);
        self.last_eval = Some(now);
    }

    /// Evaluate the clock and return the notifications it produced.
    ///
    /// Evaluations closer together than the update interval are skipped.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }
        let now = Instant::now();
        let last = self.last_eval.unwrap_or(now);
        if now.saturating_duration_since(last) < self.update_interval {
            return Vec::new();
        }
        self.evaluate(now)
    }

    /// Halt the countdown, keeping the remaining time.
    ///
    /// Time elapsed since the last evaluation is accounted first. If that uses up the
    /// clock the timer expires instead of pausing, and the returned events end with
    /// [`TimerEvent::Complete`].
    pub fn pause(&mut self) -> Vec<TimerEvent> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }
        let events = self.evaluate(Instant::now());
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
            self.last_eval = None;
        }
        events
    }

    /// Continue from the remaining time. No-op unless paused with time left.
    pub fn resume(&mut self) {
        if self.phase != TimerPhase::Paused || self.remaining.is_zero() {
            return;
        }
        self.phase = TimerPhase::Running;
        self.last_eval = Some(Instant::now());
    }

    /// Halt unconditionally without signalling expiry. Idempotent.
    pub fn stop(&mut self) {
        if self.phase == TimerPhase::Running {
            self.flush_elapsed(Instant::now());
        }
        if matches!(self.phase, TimerPhase::Running | TimerPhase::Paused) {
            self.phase = TimerPhase::Stopped;
        }
        self.last_eval = None;
    }

    /// Stop, optionally replace the duration, and refill the clock.
    pub fn reset(&mut self, new_duration: Option<Duration>) {
        self.stop();
        if let Some(duration) = new_duration {
            self.duration = duration;
        }
        self.remaining = self.duration;
        self.phase = TimerPhase::Idle;
        self.started_at = None;
        self.warned = false;
    }

    /// Extend both the remaining time and the duration.
    pub fn add_time(&mut self, extra: Duration) {
        self.remaining += extra;
        self.duration += extra;
    }

    /// Shorten the remaining time, floored at zero.
    ///
    /// Reaching zero here does not expire the timer; the next evaluation does.
    pub fn subtract_time(&mut self, amount: Duration) {
        self.remaining = self.remaining.saturating_sub(amount);
    }

    fn flush_elapsed(&mut self, now: Instant) {
        if let Some(last) = self.last_eval {
            let delta = now.saturating_duration_since(last);
            self.remaining = self.remaining.saturating_sub(delta);
        }
        self.last_eval = Some(now);
    }

    fn evaluate(&mut self, now: Instant) -> Vec<TimerEvent> {
        self.flush_elapsed(now);

        let mut events = vec![TimerEvent::Tick(self.tick_info())];

        if !self.warned && !self.remaining.is_zero() && self.remaining <= self.warning_threshold {
            self.warned = true;
            events.push(TimerEvent::Warning {
                remaining_seconds: ceil_secs(self.remaining),
            });
        }

        if self.remaining.is_zero() {
            self.phase = TimerPhase::Expired;
            self.last_eval = None;
            events.push(TimerEvent::Complete);
        }

        events
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 { secs + 1 } else { secs }
}

/// Format whole seconds as `MM:SS`.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
