use crate::models::AppSettings;
use crate::services::{QuestionRepository, YamlScoreStore};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Environment, File, FileFormat};
use std::fs;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "Manitas Data";

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "MANITAS_DATA_DIR";

/// Prefix for settings overrides, e.g. `MANITAS__SESSION__MAX_LIVES=5`.
pub const ENV_PREFIX: &str = "MANITAS";
pub const ENV_SEPARATOR: &str = "__";

pub const SETTINGS_FILE: &str = "Manitas Settings.yaml";
pub const QUESTIONS_FILE: &str = "Manitas Questions.yaml";
pub const PROGRESS_FILE: &str = "Manitas Progress.yaml";

/// Configuration manager for the MANITAS data directory.
///
/// Manages three files:
/// - Settings (`Manitas Settings.yaml`): Game mode, difficulty, session tuning
/// - Questions (`Manitas Questions.yaml`): Optional custom question bank
/// - Progress (`Manitas Progress.yaml`): High score and game history
#[derive(Debug, Clone)]
pub struct ConfigManager {
    data_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    questions_path: Utf8PathBuf,
    progress_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified data directory.
    ///
    /// # Arguments
    /// * `data_dir` - Directory containing the data files (e.g., "Manitas Data")
    ///
    /// # Returns
    /// A new ConfigManager instance; the directory is created if missing
    pub fn new<P: AsRef<Utf8Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir))?;
        }

        Ok(Self {
            settings_path: data_dir.join(SETTINGS_FILE),
            questions_path: data_dir.join(QUESTIONS_FILE),
            progress_path: data_dir.join(PROGRESS_FILE),
            data_dir,
        })
    }

    /// Create a ConfigManager for `MANITAS_DATA_DIR`, or the default directory.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::new(data_dir)
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn questions_path(&self) -> &Utf8Path {
        &self.questions_path
    }

    pub fn progress_path(&self) -> &Utf8Path {
        &self.progress_path
    }

    /// Load settings from the settings file, overridden by `MANITAS__*` variables.
    ///
    /// # Returns
    /// The loaded AppSettings, or defaults if neither source sets anything
    pub fn load_settings(&self) -> Result<AppSettings> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);
        self.load_settings_with(environment)
    }

    /// Load settings with an explicit environment source.
    ///
    /// # Arguments
    /// * `environment` - Override layer applied on top of the settings file
    pub fn load_settings_with(&self, environment: Environment) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings: AppSettings = config::Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        settings
            .effective_session_config()
            .validate()
            .with_context(|| format!("Invalid session settings in {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the settings file.
    ///
    /// # Arguments
    /// * `settings` - The AppSettings to save
    pub fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the custom question bank, or the built-in one if there is none.
    pub fn load_question_bank(&self) -> Result<QuestionRepository> {
        if !self.questions_path.exists() {
            tracing::info!("No custom question bank, using built-in questions");
            return QuestionRepository::builtin();
        }

        let file_contents = fs::read_to_string(&self.questions_path).with_context(|| {
            format!("Failed to read question bank: {}", self.questions_path)
        })?;

        let repository = QuestionRepository::from_yaml_str(&file_contents).with_context(|| {
            format!("Failed to load question bank: {}", self.questions_path)
        })?;

        tracing::info!(
            "Loaded {} questions from {}",
            repository.len(),
            self.questions_path
        );
        Ok(repository)
    }

    /// Open the progress store backed by the progress file.
    pub fn open_progress_store(&self) -> Result<YamlScoreStore> {
        YamlScoreStore::open(&self.progress_path)
            .with_context(|| format!("Failed to open progress: {}", self.progress_path))
    }
}
