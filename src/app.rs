//! Wiring shared by the CLI and the serverless trigger: credentials, clients,
//! mapping store and the job for the requested action.

use crate::adapters::notion::NotionClient;
use crate::adapters::secrets::Credentials;
use crate::adapters::todoist::TodoistClient;
use crate::config::AppConfig;
use crate::core::batch_update::{BatchUpdateJob, BatchUpdateReport};
use crate::core::engine::{failure_outcome, SyncEngine};
use crate::core::mapping::IdMappingStore;
use crate::core::project_sync::ProjectSyncPipeline;
use crate::core::task_sync::TaskSyncPipeline;
use crate::domain::model::{SyncOutcome, SyncReport, SyncResponse};
use crate::domain::ports::Storage;
use crate::instructions::parse_instructions;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::Validate;
use chrono::Local;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Projects,
    Tasks,
    Instructions(String),
}

/// Event accepted by the serverless trigger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerRequest {
    /// `projects` (default), `tasks` or `instructions`.
    pub action: Option<String>,
    pub instructions: Option<String>,
    pub dry_run: Option<bool>,
}

impl TriggerRequest {
    pub fn to_action(&self) -> Result<Action> {
        match self.action.as_deref().unwrap_or("projects") {
            "projects" => Ok(Action::Projects),
            "tasks" => Ok(Action::Tasks),
            "instructions" => self
                .instructions
                .clone()
                .map(Action::Instructions)
                .ok_or_else(|| SyncError::InvalidRequestError {
                    message: "the instructions action needs an `instructions` field".to_string(),
                }),
            other => Err(SyncError::InvalidRequestError {
                message: format!("unknown action '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchResponse {
    pub status: String,
    pub message: String,
    pub details: BatchUpdateReport,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseBody {
    Sync(SyncResponse),
    Batch(BatchResponse),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TriggerResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl From<SyncOutcome> for TriggerResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            status_code: outcome.status_code,
            body: ResponseBody::Sync(outcome.body),
        }
    }
}

impl From<BatchUpdateReport> for TriggerResponse {
    fn from(report: BatchUpdateReport) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Batch(BatchResponse {
                status: report.status().to_string(),
                message: report.message(),
                details: report,
            }),
        }
    }
}

/// Response for a run that failed before producing a report.
pub fn error_response(err: &SyncError) -> TriggerResponse {
    failure_outcome(err, SyncReport::default()).into()
}

/// Runs one action end to end. Never fails: errors become error responses.
pub async fn run_action<S: Storage>(config: &AppConfig, storage: S, action: Action) -> TriggerResponse {
    match try_run_action(config, storage, action).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

async fn try_run_action<S: Storage>(
    config: &AppConfig,
    storage: S,
    action: Action,
) -> Result<TriggerResponse> {
    config.validate()?;

    let client = config.http_client()?;
    let secrets = config.secret_provider(client.clone())?;
    let credentials = Credentials::resolve(&*secrets).await?;

    let todoist = TodoistClient::new(
        client.clone(),
        &config.todoist.base_url,
        &credentials.todoist_api_key,
    );
    let notion = NotionClient::new(
        client,
        &config.notion.base_url,
        &credentials.notion_api_key,
        &config.notion.version,
    );
    let options = config.sync_options();

    match action {
        Action::Projects => {
            let mapping = IdMappingStore::load(storage, "projects").await?;
            let pipeline = ProjectSyncPipeline::new(
                todoist,
                notion,
                credentials.projects_database_id.clone(),
                mapping,
                options,
            );
            Ok(SyncEngine::new(pipeline).run_to_outcome().await.into())
        }
        Action::Tasks => {
            let database_id = credentials.require_tasks_database()?.to_string();
            let mapping = IdMappingStore::load(storage, "tasks").await?;
            let pipeline = TaskSyncPipeline::new(todoist, notion, database_id, mapping, options);
            Ok(SyncEngine::new(pipeline).run_to_outcome().await.into())
        }
        Action::Instructions(text) => {
            let parsed = parse_instructions(&text, Local::now().date_naive());
            if parsed.instructions.is_empty() && parsed.rejected.is_empty() {
                return Err(SyncError::InstructionError {
                    message: "No instructions were given".to_string(),
                });
            }
            tracing::info!(
                "Parsed {} instruction(s), rejected {}",
                parsed.instructions.len(),
                parsed.rejected.len()
            );
            let report = BatchUpdateJob::new(todoist, options.dry_run)
                .run(parsed)
                .await?;
            tracing::info!("{}", report.message());
            Ok(report.into())
        }
    }
}
