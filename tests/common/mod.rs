#![allow(dead_code)]

use httpmock::MockServer;
use todoist_notion_sync::app::ResponseBody;
use todoist_notion_sync::config::{AppConfig, SecretsProviderKind, StorageKind};
use todoist_notion_sync::domain::model::{MatchStrategy, SyncResponse};
use todoist_notion_sync::app::BatchResponse;
use todoist_notion_sync::TriggerResponse;

pub const TODOIST_KEY: &str = "fake_todoist_key";
pub const NOTION_KEY: &str = "fake_notion_key";
pub const PROJECTS_DB: &str = "fake_db_id";
pub const TASKS_DB: &str = "fake_tasks_db_id";

/// Both vendors served by one mock server, credentials taken from the config.
pub fn config_for(server: &MockServer, strategy: MatchStrategy) -> AppConfig {
    let mut config = AppConfig::default();
    config.todoist.base_url = server.url("/rest/v2");
    config.notion.base_url = server.url("/v1");
    config.todoist.api_key = Some(TODOIST_KEY.to_string());
    config.notion.api_key = Some(NOTION_KEY.to_string());
    config.notion.projects_database_id = Some(PROJECTS_DB.to_string());
    config.notion.tasks_database_id = Some(TASKS_DB.to_string());
    config.secrets.provider = SecretsProviderKind::Config;
    config.storage.kind = StorageKind::Memory;
    config.sync.match_strategy = strategy;
    config
}

pub fn sync_body(response: TriggerResponse) -> SyncResponse {
    match response.body {
        ResponseBody::Sync(body) => body,
        other => panic!("expected a sync response, got {:?}", other),
    }
}

pub fn batch_body(response: TriggerResponse) -> BatchResponse {
    match response.body {
        ResponseBody::Batch(body) => body,
        other => panic!("expected a batch response, got {:?}", other),
    }
}
