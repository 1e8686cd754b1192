pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod instructions;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use adapters::storage::{LocalStorage, MemoryStorage};
pub use app::{run_action, Action, TriggerResponse};
pub use config::AppConfig;
pub use core::engine::SyncEngine;
pub use utils::error::{Result, SyncError};
