//! Integration tests for the session runtime
//!
//! The runtime owns the engine on its own task and ticks it on an interval. With tokio's
//! clock paused, idle periods are skipped automatically, so whole sessions (including
//! unanswered questions running out) play out in a few milliseconds of real time.
//!
//! These tests verify:
//! - Commands sent through a SessionHandle reach the engine
//! - Unanswered questions time out without any input
//! - Pausing through the handle holds the session
//! - Shutdown hands the engine back in a terminal phase

use manitas::events::GameEvent;
use manitas::models::{
    DifficultyPreset, GameMode, GameResult, QuestionLimit, QuestionRecord, SessionConfig,
    SessionPhase,
};
use manitas::services::QuestionRepository;
use manitas::{GameEngine, SessionRuntime};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio_test::assert_ok;

fn engine(questions: u32, lives: u32) -> GameEngine {
    let records = (1..=6)
        .map(|id| QuestionRecord {
            id,
            text: format!("Question {}", id),
            options: vec!["yes".into(), "no".into(), "maybe".into(), "never".into()],
            correct_index: 0,
            category: "General".into(),
            difficulty: 1,
            explanation: format!("Explanation {}", id),
        })
        .collect();
    let repository = Arc::new(QuestionRepository::new(records).unwrap());
    let config = SessionConfig {
        questions_per_game: QuestionLimit::Bounded(questions),
        max_lives: lives,
        ..SessionConfig::default()
    };
    GameEngine::new(config, repository).unwrap().with_seed(5)
}

/// Wait for the first event matching `pred`, skipping over lagged tick traffic.
async fn wait_for<F>(events: &mut Receiver<GameEvent>, mut pred: F) -> GameEvent
where
    F: FnMut(&GameEvent) -> bool,
{
    loop {
        match events.recv().await {
            Ok(event) if pred(&event) => return event,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => panic!("event bus closed"),
        }
    }
}

async fn wait_for_end(events: &mut Receiver<GameEvent>) -> GameResult {
    match wait_for(events, |e| matches!(e, GameEvent::GameEnded(_))).await {
        GameEvent::GameEnded(result) => result,
        other => panic!("expected game end, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_answered_session_completes() {
    let runtime = SessionRuntime::spawn(engine(2, 3));
    let handle = runtime.handle();
    let mut events = handle.subscribe();

    assert_ok!(handle.start().await);
    for _ in 0..2 {
        wait_for(&mut events, |e| matches!(e, GameEvent::QuestionChanged { .. })).await;
        assert_ok!(handle.answer(0).await);
    }

    let result = wait_for_end(&mut events).await;
    assert!(result.completed);
    assert_eq!(result.correct_answers, 2);
    assert_eq!(result.lives_bonus, 1500);
    assert_eq!(handle.result().await.unwrap(), result);

    let engine = runtime.shutdown().await.unwrap();
    assert_eq!(engine.phase(), SessionPhase::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_questions_time_out() {
    let runtime = SessionRuntime::spawn(engine(2, 3));
    let handle = runtime.handle();
    let mut events = handle.subscribe();

    assert_ok!(handle.start().await);

    let mut expired = 0;
    let result = loop {
        match events.recv().await {
            Ok(GameEvent::TimeExpired { .. }) => expired += 1,
            Ok(GameEvent::GameEnded(result)) => break result,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => panic!("event bus closed"),
        }
    };

    assert_eq!(expired, 2);
    assert!(result.completed);
    assert_eq!(result.correct_answers, 0);
    assert_eq!(result.lives_left, 1);
    assert_eq!(result.lives_bonus, 500);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_single_life_timeout_is_game_over() {
    let runtime = SessionRuntime::spawn(engine(5, 3));
    let handle = runtime.handle();
    let mut events = handle.subscribe();

    assert_ok!(handle.set_game_mode(GameMode::TimeAttack).await);
    assert_ok!(handle.set_difficulty(DifficultyPreset::Hard).await);
    assert_ok!(handle.start().await);

    let result = wait_for_end(&mut events).await;
    assert!(result.game_over);
    assert_eq!(result.total_questions, 1);
    // Hard difficulty gives 15 seconds, then the feedback delay
    assert!(result.total_elapsed_secs >= 16.5);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pause_holds_session() {
    let runtime = SessionRuntime::spawn(engine(3, 3));
    let handle = runtime.handle();
    let mut events = handle.subscribe();

    assert_ok!(handle.start().await);
    wait_for(&mut events, |e| matches!(e, GameEvent::QuestionChanged { .. })).await;
    assert_ok!(handle.pause().await);
    wait_for(&mut events, |e| matches!(e, GameEvent::Paused)).await;

    tokio::time::sleep(Duration::from_secs(300)).await;

    let state = handle.snapshot().await.unwrap();
    assert_eq!(state.phase, SessionPhase::Paused);
    assert_eq!(state.lives, 3);
    assert_eq!(state.questions_asked, 1);

    assert_ok!(handle.resume().await);
    wait_for(&mut events, |e| matches!(e, GameEvent::TimeExpired { .. })).await;
    assert_eq!(handle.snapshot().await.unwrap().lives, 2);

    let engine = runtime.shutdown().await.unwrap();
    assert_eq!(engine.phase(), SessionPhase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_handles_are_shared() {
    let runtime = SessionRuntime::spawn(engine(3, 3));
    let first = runtime.handle();
    let second = first.clone();

    assert_ok!(first.start().await);
    assert_ok!(second.select_option(3).await);
    assert_ok!(first.submit_answer().await);

    let state = second.snapshot().await.unwrap();
    assert_eq!(state.selected_option, Some(3));
    assert_eq!(state.incorrect_count, 1);
    assert_eq!(first.high_score().await.unwrap(), 0);

    runtime.shutdown().await.unwrap();
    assert!(!first.is_alive());
    assert!(second.stop().await.is_err());
}
