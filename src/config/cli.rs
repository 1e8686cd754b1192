use crate::config::toml_config::AppConfig;
use crate::domain::model::MatchStrategy;
use crate::utils::error::{Result, SyncError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "todoist-notion-sync")]
#[command(about = "Sync Todoist projects and tasks into Notion databases")]
pub struct CliConfig {
    #[arg(long, short, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, global = true, help = "Override sync.match_strategy")]
    pub match_strategy: Option<MatchStrategy>,

    #[arg(long, global = true, help = "Plan and log changes without writing")]
    pub dry_run: bool,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create or update a Notion page for every Todoist project
    Projects,
    /// Create or update a Notion page for every active Todoist task
    Tasks,
    /// Apply natural-language instructions to Todoist tasks
    Apply {
        #[arg(long, conflicts_with = "file", help = "Instructions, one per line or ';'-separated")]
        text: Option<String>,

        #[arg(long, help = "Read instructions from a file")]
        file: Option<PathBuf>,
    },
}

impl CliConfig {
    /// Loads the configuration file (or defaults) and applies flag overrides.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(strategy) = self.match_strategy {
            config.sync.match_strategy = strategy;
        }
        if self.dry_run {
            config.sync.dry_run = true;
        }

        Ok(config)
    }

    /// The instruction text for `apply`, if that is the command.
    pub fn instructions(&self) -> Result<Option<String>> {
        match &self.command {
            Command::Apply {
                text: Some(text), ..
            } => Ok(Some(text.clone())),
            Command::Apply {
                file: Some(path), ..
            } => Ok(Some(std::fs::read_to_string(path)?)),
            Command::Apply { .. } => Err(SyncError::MissingConfigError {
                field: "--text or --file".to_string(),
            }),
            _ => Ok(None),
        }
    }
}
