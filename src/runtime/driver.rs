// SessionRuntime - drives a GameEngine on a single tokio task
//
// The engine is cooperative: it only changes when a command arrives or when it is
// ticked. This task is the one place that does both, so commands, countdown
// evaluations and post-answer continuations never interleave.

use super::handle::{COMMAND_CHANNEL_CAPACITY, SessionCommand, SessionHandle};
use crate::engine::GameEngine;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns the task that runs a [`GameEngine`]
///
/// # Example
/// ```ignore
/// let runtime = SessionRuntime::spawn(engine);
/// let handle = runtime.handle();
/// let mut events = handle.subscribe();
///
/// handle.start().await?;
/// while let Ok(event) = events.recv().await {
///     // render event...
/// }
///
/// runtime.shutdown().await?;
/// ```
pub struct SessionRuntime {
    handle: SessionHandle,
    task: JoinHandle<GameEngine>,
}

impl SessionRuntime {
    /// Move `engine` onto a new task and start ticking it
    ///
    /// The tick period is the engine's configured `tick_interval_ms`.
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: GameEngine) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let handle = SessionHandle::new(tx, engine.events().clone());
        let period = Duration::from_millis(engine.config().tick_interval_ms.max(1));

        let task = tokio::spawn(run(engine, rx, period));

        Self { handle, task }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop any session, end the task and hand the engine back
    pub async fn shutdown(self) -> Result<GameEngine> {
        // The task may already have exited if every handle was dropped
        let _ = self.handle.shutdown().await;
        self.task.await.context("Session runtime task panicked")
    }
}

async fn run(
    mut engine: GameEngine,
    mut rx: mpsc::Receiver<SessionCommand>,
    period: Duration,
) -> GameEngine {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!("Session runtime started (tick every {:?})", period);

    loop {
        tokio::select! {
            command = rx.recv() => {
                match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => apply(&mut engine, command),
                }
            }
            _ = interval.tick() => engine.tick(),
        }
    }

    engine.stop();
    engine.metrics().log_summary();
    tracing::debug!("Session runtime terminated");
    engine
}

fn apply(engine: &mut GameEngine, command: SessionCommand) {
    match command {
        SessionCommand::Start => engine.start(),
        SessionCommand::Select(index) => engine.select_option(index),
        SessionCommand::Submit => engine.submit_answer(),
        SessionCommand::Answer(index) => engine.answer(index),
        SessionCommand::Pause => engine.pause(),
        SessionCommand::Resume => engine.resume(),
        SessionCommand::Stop => engine.stop(),
        SessionCommand::SetGameMode(mode) => engine.set_game_mode(mode),
        SessionCommand::SetDifficulty(difficulty) => engine.set_difficulty(difficulty),
        SessionCommand::Snapshot(reply) => {
            // Requester may have given up waiting
            let _ = reply.send(engine.snapshot());
        }
        SessionCommand::Result(reply) => {
            let _ = reply.send(engine.get_result());
        }
        SessionCommand::HighScore(reply) => {
            let _ = reply.send(engine.high_score());
        }
        SessionCommand::Shutdown => {}
    }
}
