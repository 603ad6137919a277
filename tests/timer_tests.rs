//! Integration tests for the countdown timer
//!
//! These tests run against tokio's paused clock, so "waiting" is instant and exact.
//! They verify:
//! - A full countdown ends at zero with exactly one completion
//! - Pausing freezes the remaining time
//! - A stopped timer never reports completion
//! - Slow tick cadences self-correct against the wall clock
//! - Adding or removing time never restarts or expires the clock on its own

use manitas::services::{CountdownTimer, TimerEvent, TimerPhase, format_time};
use std::time::Duration;
use tokio::time::advance;

fn count_completions(events: &[TimerEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, TimerEvent::Complete))
        .count()
}

/// Drive `timer` in `step` increments for `total`, collecting every event.
async fn run_for(timer: &mut CountdownTimer, total: Duration, step: Duration) -> Vec<TimerEvent> {
    let mut events = Vec::new();
    let mut waited = Duration::ZERO;
    while waited < total {
        advance(step).await;
        waited += step;
        events.extend(timer.tick());
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_full_countdown_completes_once() {
    let mut timer = CountdownTimer::new(Duration::from_secs(20));
    timer.start();

    let events = run_for(&mut timer, Duration::from_secs(25), Duration::from_millis(100)).await;

    assert_eq!(timer.remaining(), Duration::ZERO);
    assert_eq!(timer.phase(), TimerPhase::Expired);
    assert_eq!(count_completions(&events), 1);
    assert!(matches!(events.last(), Some(TimerEvent::Complete)));
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_remaining_time() {
    let mut timer = CountdownTimer::new(Duration::from_secs(20));
    timer.start();

    advance(Duration::from_secs(5)).await;
    timer.pause();
    assert_eq!(timer.phase(), TimerPhase::Paused);

    advance(Duration::from_secs(60)).await;
    assert!(timer.tick().is_empty());
    assert_eq!(timer.remaining(), Duration::from_secs(15));

    timer.resume();
    advance(Duration::from_secs(3)).await;
    timer.tick();
    assert_eq!(timer.remaining(), Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn test_stopped_timer_never_completes() {
    let mut timer = CountdownTimer::new(Duration::from_secs(10));
    timer.start();

    advance(Duration::from_secs(4)).await;
    timer.stop();
    assert_eq!(timer.phase(), TimerPhase::Stopped);
    assert_eq!(timer.remaining(), Duration::from_secs(6));

    let events = run_for(&mut timer, Duration::from_secs(20), Duration::from_secs(1)).await;
    assert!(events.is_empty());

    // Stopping twice is harmless
    timer.stop();
    assert_eq!(timer.phase(), TimerPhase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_sparse_ticks_track_wall_clock() {
    let mut timer = CountdownTimer::new(Duration::from_secs(20));
    timer.start();

    // One late tick accounts for the whole gap
    advance(Duration::from_millis(7_300)).await;
    let events = timer.tick();
    assert_eq!(timer.remaining(), Duration::from_millis(12_700));

    match events.first() {
        Some(TimerEvent::Tick(info)) => {
            assert_eq!(info.remaining_seconds, 13);
            assert_eq!(info.formatted_time, "00:13");
        }
        other => panic!("expected a tick, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_warning_fires_once_per_run() {
    let mut timer = CountdownTimer::new(Duration::from_secs(8));
    timer.start();

    let events = run_for(&mut timer, Duration::from_secs(7), Duration::from_millis(500)).await;
    let warnings: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, TimerEvent::Warning { .. }))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0], &TimerEvent::Warning { remaining_seconds: 5 });

    // A fresh run re-arms the warning
    timer.reset(Some(Duration::from_secs(6)));
    timer.start();
    let events = run_for(&mut timer, Duration::from_secs(2), Duration::from_secs(1)).await;
    assert!(events.iter().any(|event| matches!(event, TimerEvent::Warning { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_expiry_at_pause_completes_instead() {
    let mut timer = CountdownTimer::new(Duration::from_secs(3));
    timer.start();

    advance(Duration::from_secs(4)).await;
    let events = timer.pause();

    assert_eq!(timer.phase(), TimerPhase::Expired);
    assert_eq!(count_completions(&events), 1);

    timer.resume();
    assert_eq!(timer.phase(), TimerPhase::Expired);
}

#[tokio::test(start_paused = true)]
async fn test_subtract_to_zero_expires_on_next_evaluation() {
    let mut timer = CountdownTimer::new(Duration::from_secs(20));
    timer.start();

    timer.subtract_time(Duration::from_secs(25));
    assert_eq!(timer.remaining(), Duration::ZERO);
    assert_eq!(timer.phase(), TimerPhase::Running);

    advance(Duration::from_millis(100)).await;
    let events = timer.tick();
    assert_eq!(count_completions(&events), 1);
    assert!(!events.iter().any(|e| matches!(e, TimerEvent::Warning { .. })));
    assert_eq!(timer.phase(), TimerPhase::Expired);

    advance(Duration::from_millis(100)).await;
    assert!(timer.tick().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resume_without_time_left_stays_paused() {
    let mut timer = CountdownTimer::new(Duration::from_secs(20));
    timer.start();

    advance(Duration::from_secs(2)).await;
    assert!(timer.pause().iter().all(|e| !matches!(e, TimerEvent::Complete)));
    timer.subtract_time(Duration::from_secs(18));
    assert_eq!(timer.remaining(), Duration::ZERO);

    timer.resume();
    assert_eq!(timer.phase(), TimerPhase::Paused);

    advance(Duration::from_secs(1)).await;
    assert!(timer.tick().is_empty());
    assert_eq!(timer.phase(), TimerPhase::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_add_time_while_running() {
    let mut timer = CountdownTimer::new(Duration::from_secs(20));
    timer.start();

    advance(Duration::from_secs(5)).await;
    timer.add_time(Duration::from_secs(3));
    timer.tick();

    assert_eq!(timer.phase(), TimerPhase::Running);
    assert_eq!(timer.remaining(), Duration::from_secs(18));
    assert_eq!(timer.duration(), Duration::from_secs(23));
    // Still the same run
    assert_eq!(timer.elapsed(), Duration::from_secs(5));
}

#[test]
fn test_format_time() {
    assert_eq!(format_time(0), "00:00");
    assert_eq!(format_time(20), "00:20");
    assert_eq!(format_time(125), "02:05");
}
