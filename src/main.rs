//! MANITAS - timed hand-hygiene and workplace-safety trivia quiz
//!
//! Main entry point for the terminal front-end.
//!
//! # Overview
//!
//! This binary wires the library together and plays sessions on stdin/stdout:
//! - Logging infrastructure (file rotation, optional console output on stderr)
//! - Settings and question bank loading ([`ConfigManager`])
//! - Progress persistence (`Manitas Progress.yaml`)
//! - The session runtime ([`SessionRuntime`]), which owns the engine on a tokio task
//!
//! # Execution Flow
//!
//! 1. Load settings from `Manitas Data/` (or `MANITAS_DATA_DIR`)
//! 2. Initialize logging → logs/manitas.<date> (plain text, or JSON lines with `json_log`)
//! 3. Load the question bank and open the progress store
//! 4. Spawn the session runtime and start the first session
//! 5. Render events and forward typed commands until the player quits
//! 6. Shut the runtime down and log the metrics summary
//!
//! # Commands
//!
//! - `a`-`d`: answer the current question
//! - `p` / `r`: pause / resume
//! - `n`: start a new session once the current one has ended
//! - `q`: stop the session and quit

use anyhow::{Context, Result};
use manitas::events::GameEvent;
use manitas::logging::{DEFAULT_LOG_DIR, DEFAULT_LOG_PREFIX};
use manitas::models::{AnswerOutcome, GameResult, QuestionRecord};
use manitas::services::MemoryScoreStore;
use manitas::{
    APP_NAME, ConfigManager, GameEngine, Metrics, ScoreStore, SessionHandle, SessionRuntime,
    VERSION,
};
use regex::Regex;
use std::io::Write;
use std::sync::{Arc, LazyLock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?i:(?P<answer>[a-d])|(?P<pause>p|pausa)|(?P<resume>r|seguir)|(?P<new>n|nueva)|(?P<quit>q|salir)|(?P<help>h|\?|ayuda))\s*$")
        .expect("command pattern is valid")
});

/// A line typed by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerminalCommand {
    Answer(usize),
    Pause,
    Resume,
    NewGame,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Option<TerminalCommand> {
    let caps = COMMAND_RE.captures(line)?;
    if let Some(answer) = caps.name("answer") {
        let letter = answer.as_str().to_ascii_lowercase().chars().next()?;
        return Some(TerminalCommand::Answer((letter as u8 - b'a') as usize));
    }
    if caps.name("pause").is_some() {
        Some(TerminalCommand::Pause)
    } else if caps.name("resume").is_some() {
        Some(TerminalCommand::Resume)
    } else if caps.name("new").is_some() {
        Some(TerminalCommand::NewGame)
    } else if caps.name("quit").is_some() {
        Some(TerminalCommand::Quit)
    } else {
        Some(TerminalCommand::Help)
    }
}

/// Main entry point for the MANITAS terminal quiz
///
/// # Errors
///
/// This function can fail if:
/// - The settings file is invalid YAML or fails validation
/// - Logging initialization fails (disk space, permissions)
/// - A custom question bank is present but invalid
/// - Tokio runtime creation fails
fn main() -> Result<()> {
    let config_manager = ConfigManager::from_env()?;
    let settings = config_manager.load_settings()?;

    let _log_guard = if settings.json_log {
        manitas::logging::setup_json_logging(DEFAULT_LOG_DIR, DEFAULT_LOG_PREFIX, settings.debug_mode)?
    } else {
        manitas::logging::setup_logging_with_console(
            DEFAULT_LOG_DIR,
            DEFAULT_LOG_PREFIX,
            settings.debug_mode,
            settings.console_log,
        )?
    };

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let repository = Arc::new(config_manager.load_question_bank()?);
    let stats = repository.stats();
    tracing::info!(
        "Question bank: {} questions in {} categories ({} easy, {} medium, {} hard)",
        stats.total,
        stats.categories,
        stats.easy,
        stats.medium,
        stats.hard
    );

    // A broken progress file should not keep the player from playing
    let store: Arc<dyn ScoreStore> = match config_manager.open_progress_store() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("Progress will not be saved: {:#}", e);
            Arc::new(MemoryScoreStore::new())
        }
    };

    let metrics = Arc::new(Metrics::new());
    let mut engine = GameEngine::new(settings.effective_session_config(), repository)
        .context("Invalid session configuration")?
        .with_store(store)
        .with_metrics(metrics);
    if let Some(seed) = settings.shuffle_seed {
        engine = engine.with_seed(seed);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("manitas-worker")
        .build()?;

    let result = runtime.block_on(play(engine));

    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    tracing::info!("Application shutdown complete");

    result
}

async fn play(engine: GameEngine) -> Result<()> {
    let session = SessionRuntime::spawn(engine);
    let handle = session.handle();
    let mut events = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = TerminalView::default();

    println!("=== {} v{} ===", APP_NAME.to_uppercase(), VERSION);
    println!("Récord actual: {}", handle.high_score().await?);
    print_help();
    handle.start().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Some(TerminalCommand::Quit) => break,
                    Some(command) => dispatch(&handle, command).await?,
                    None if line.trim().is_empty() => {}
                    None => println!("Comando no reconocido. Escribe 'h' para ver la ayuda."),
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => view.render(&event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::debug!("Terminal view skipped {} events", missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    handle.stop().await?;
    session.shutdown().await?;
    println!("\n¡Hasta pronto!");
    Ok(())
}

async fn dispatch(handle: &SessionHandle, command: TerminalCommand) -> Result<()> {
    match command {
        TerminalCommand::Answer(index) => handle.answer(index).await,
        TerminalCommand::Pause => handle.pause().await,
        TerminalCommand::Resume => handle.resume().await,
        TerminalCommand::NewGame => handle.start().await,
        TerminalCommand::Help => {
            print_help();
            Ok(())
        }
        TerminalCommand::Quit => handle.stop().await,
    }
}

fn print_help() {
    println!("Comandos: a-d responder | p pausa | r seguir | n nueva partida | q salir");
}

/// Renders events as plain text
#[derive(Default)]
struct TerminalView {
    /// Last whole second shown on the countdown line
    last_second: Option<u64>,
}

impl TerminalView {
    fn render(&mut self, event: &GameEvent) {
        match event {
            GameEvent::GameStarted(state) => {
                println!("\n¡Comienza la partida! Vidas: {}", state.lives);
            }
            GameEvent::QuestionChanged {
                question,
                number,
                total,
            } => {
                self.last_second = None;
                print_question(question, *number, *total);
            }
            GameEvent::TimerTick(info) => {
                if self.last_second != Some(info.remaining_seconds) {
                    self.last_second = Some(info.remaining_seconds);
                    print!("\r  ⏱ {}  ", info.formatted_time);
                    let _ = std::io::stdout().flush();
                }
            }
            GameEvent::TimerWarning { remaining_seconds } => {
                println!("\n  ¡Quedan {} segundos!", remaining_seconds);
            }
            GameEvent::AnswerSubmitted(outcome) => print_outcome(outcome),
            GameEvent::TimeExpired {
                question,
                explanation,
            } => {
                println!("\n  ¡Tiempo agotado!");
                print_correct_option(question);
                if !explanation.is_empty() {
                    println!("  {}", explanation);
                }
            }
            GameEvent::Streak { count } => println!("  ¡Racha de {}!", count),
            GameEvent::LifeLost { lives_remaining } => {
                println!("  Vidas restantes: {}", lives_remaining)
            }
            GameEvent::ScoreUpdated { total, earned } => {
                println!("  +{} puntos (total {})", earned, total)
            }
            GameEvent::Paused => println!("\n  [pausa] escribe 'r' para seguir"),
            GameEvent::Resumed => println!("  [seguimos]"),
            GameEvent::GameEnded(result) => print_result(result),
            GameEvent::TimerComplete => {}
        }
    }
}

fn print_question(question: &QuestionRecord, number: u32, total: Option<u32>) {
    let position = match total {
        Some(total) => format!("{}/{}", number, total),
        None => number.to_string(),
    };
    println!("\nPregunta {} [{}]", position, question.category);
    println!("{}", question.text);
    for (index, option) in question.options.iter().enumerate() {
        println!("  {}) {}", QuestionRecord::option_label(index), option);
    }
}

fn print_correct_option(question: &QuestionRecord) {
    if let Some(option) = question.correct_option() {
        println!(
            "  Respuesta correcta: {}) {}",
            QuestionRecord::option_label(question.correct_index),
            option
        );
    }
}

fn print_outcome(outcome: &AnswerOutcome) {
    if outcome.correct {
        println!("\n  ¡Correcto! ({:.1}s)", outcome.time_taken_secs);
    } else {
        println!("\n  Incorrecto.");
        print_correct_option(&outcome.question);
    }
    if !outcome.explanation.is_empty() {
        println!("  {}", outcome.explanation);
    }
}

fn print_result(result: &GameResult) {
    let title = if result.completed {
        "¡FELICIDADES! Has completado el juego"
    } else if result.game_over {
        "GAME OVER: se te han acabado las vidas"
    } else {
        "Partida detenida"
    };
    println!("\n=== {} ===", title);
    println!("  Puntaje final: {}", result.score);
    if result.completed {
        println!(
            "  Bonus: {} por vidas, {} por tiempo",
            result.lives_bonus, result.time_bonus
        );
    }
    println!(
        "  Respuestas correctas: {}/{} ({:.0}%)",
        result.correct_answers, result.total_questions, result.accuracy_percent
    );
    println!("  Mejor racha: {}", result.best_streak);
    println!("  Tiempo total: {}", result.formatted_elapsed());
    if result.new_record {
        println!("  ¡NUEVO RÉCORD!");
    }
    println!("\nEscribe 'n' para jugar de nuevo o 'q' para salir.");
}
