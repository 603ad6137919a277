// SessionHandle - cloneable command sender for a running SessionRuntime
//
// Front-ends never touch the engine directly. They hold a SessionHandle, send
// commands through a bounded channel and read GameEvents from the bus.

use crate::events::{EventBus, GameEvent};
use crate::models::{DifficultyPreset, GameMode, GameResult, SessionState};
use anyhow::{Context, Result, anyhow};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Bounded so a stuck engine task pushes back on the front-end
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Commands accepted by the runtime task
#[derive(Debug)]
pub enum SessionCommand {
    Start,
    Select(usize),
    Submit,
    /// Select and submit in one step
    Answer(usize),
    Pause,
    Resume,
    Stop,
    SetGameMode(GameMode),
    SetDifficulty(DifficultyPreset),
    Snapshot(oneshot::Sender<SessionState>),
    Result(oneshot::Sender<GameResult>),
    HighScore(oneshot::Sender<u64>),
    /// Stop any session and end the task
    Shutdown,
}

/// Lightweight handle that can be cloned into every input source
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    events: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>, events: EventBus) -> Self {
        Self { tx, events }
    }

    /// Send a raw command
    ///
    /// # Returns
    /// An error only if the runtime task has ended
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| anyhow!("Session runtime has shut down"))
    }

    pub async fn start(&self) -> Result<()> {
        self.send(SessionCommand::Start).await
    }

    pub async fn select_option(&self, index: usize) -> Result<()> {
        self.send(SessionCommand::Select(index)).await
    }

    pub async fn submit_answer(&self) -> Result<()> {
        self.send(SessionCommand::Submit).await
    }

    pub async fn answer(&self, index: usize) -> Result<()> {
        self.send(SessionCommand::Answer(index)).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(SessionCommand::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(SessionCommand::Stop).await
    }

    pub async fn set_game_mode(&self, mode: GameMode) -> Result<()> {
        self.send(SessionCommand::SetGameMode(mode)).await
    }

    pub async fn set_difficulty(&self, difficulty: DifficultyPreset) -> Result<()> {
        self.send(SessionCommand::SetDifficulty(difficulty)).await
    }

    /// Current session state, as seen by the runtime task
    pub async fn snapshot(&self) -> Result<SessionState> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply)).await?;
        rx.await.context("Session runtime dropped the snapshot request")
    }

    pub async fn result(&self) -> Result<GameResult> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Result(reply)).await?;
        rx.await.context("Session runtime dropped the result request")
    }

    pub async fn high_score(&self) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::HighScore(reply)).await?;
        rx.await.context("Session runtime dropped the high score request")
    }

    /// Ask the runtime task to stop the session and exit
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Whether the runtime task is still accepting commands
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}
