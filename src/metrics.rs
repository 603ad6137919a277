// Session metrics module
//
// Provides lightweight counters for monitoring quiz sessions

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session and event counters
///
/// Uses atomic operations so the engine task and the front-end can share one
/// instance without locks. Logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Sessions started
    pub sessions_started: AtomicU64,

    /// Sessions that asked every configured question
    pub sessions_completed: AtomicU64,

    /// Sessions that ran out of lives
    pub sessions_game_over: AtomicU64,

    /// Sessions stopped by the player
    pub sessions_stopped: AtomicU64,

    pub answers_correct: AtomicU64,
    pub answers_incorrect: AtomicU64,

    /// Questions that ran out of time with nothing selected
    pub timeouts: AtomicU64,

    /// Total time spent answering, in milliseconds
    pub total_answer_time_ms: AtomicU64,

    /// Events sent on the bus
    pub events_broadcast: AtomicU64,

    /// Events sent while nobody was subscribed
    pub events_unobserved: AtomicU64,

    /// Persistence calls that failed
    pub store_failures: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            sessions_game_over: AtomicU64::new(0),
            sessions_stopped: AtomicU64::new(0),
            answers_correct: AtomicU64::new(0),
            answers_incorrect: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            total_answer_time_ms: AtomicU64::new(0),
            events_broadcast: AtomicU64::new(0),
            events_unobserved: AtomicU64::new(0),
            store_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_game_over(&self) {
        self.sessions_game_over.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_stopped(&self) {
        self.sessions_stopped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an answered question and how long it took
    pub fn record_answer(&self, correct: bool, time_taken: Duration) {
        if correct {
            self.answers_correct.fetch_add(1, Ordering::Relaxed);
        } else {
            self.answers_incorrect.fetch_add(1, Ordering::Relaxed);
        }
        self.total_answer_time_ms
            .fetch_add(time_taken.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self, delivered: bool) {
        self.events_broadcast.fetch_add(1, Ordering::Relaxed);
        if !delivered {
            self.events_unobserved.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average answer time in milliseconds, timeouts included
    pub fn avg_answer_time_ms(&self) -> f64 {
        let total = self.total_answer_time_ms.load(Ordering::Relaxed);
        let count = self.answers_correct.load(Ordering::Relaxed)
            + self.answers_incorrect.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Sessions: {} started, {} completed, {} game over, {} stopped",
            self.sessions_started.load(Ordering::Relaxed),
            self.sessions_completed.load(Ordering::Relaxed),
            self.sessions_game_over.load(Ordering::Relaxed),
            self.sessions_stopped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Answers: {} correct, {} incorrect ({} timeouts), avg {:.0}ms",
            self.answers_correct.load(Ordering::Relaxed),
            self.answers_incorrect.load(Ordering::Relaxed),
            self.timeouts.load(Ordering::Relaxed),
            self.avg_answer_time_ms()
        );
        tracing::info!(
            "Events: {} broadcast, {} unobserved; store failures: {}",
            self.events_broadcast.load(Ordering::Relaxed),
            self.events_unobserved.load(Ordering::Relaxed),
            self.store_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.sessions_started.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.answers_correct.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_session_outcomes() {
        let metrics = Metrics::new();

        metrics.record_session_started();
        metrics.record_session_started();
        metrics.record_session_completed();
        metrics.record_game_over();

        assert_eq!(metrics.sessions_started.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.sessions_completed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.sessions_game_over.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.sessions_stopped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_answers() {
        let metrics = Metrics::new();

        metrics.record_answer(true, Duration::from_millis(4000));
        metrics.record_answer(false, Duration::from_millis(2000));
        metrics.record_timeout();

        assert_eq!(metrics.answers_correct.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.answers_incorrect.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.timeouts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.avg_answer_time_ms(), 3000.0);
    }

    #[test]
    fn test_avg_answer_time_no_answers() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_answer_time_ms(), 0.0);
    }

    #[test]
    fn test_event_counters() {
        let metrics = Metrics::new();

        metrics.record_event(true);
        metrics.record_event(false);
        metrics.record_store_failure();

        assert_eq!(metrics.events_broadcast.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.events_unobserved.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.store_failures.load(Ordering::Relaxed), 1);
    }
}
