mod common;

use anyhow::Result;
use base64::Engine;
use common::*;
use httpmock::prelude::*;
use serde_json::json;
use todoist_notion_sync::adapters::secrets::GcpSecretManager;
use todoist_notion_sync::config::SecretsProviderKind;
use todoist_notion_sync::domain::model::MatchStrategy;
use todoist_notion_sync::domain::ports::SecretProvider;
use todoist_notion_sync::{run_action, Action, MemoryStorage, SyncError};

fn encoded(value: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(value)
}

async fn mock_secret(server: &MockServer, secret_id: &str, value: &str) {
    let path = format!(
        "/secretmanager/projects/test-project/secrets/{}/versions/latest:access",
        secret_id
    );
    let data = encoded(value);
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path(path)
                .header("Authorization", "Bearer metadata-token");
            then.status(200).json_body(json!({
                "name": "projects/test-project/secrets/x/versions/1",
                "payload": {"data": data}
            }));
        })
        .await;
}

async fn mock_metadata(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/computeMetadata/v1/instance/service-accounts/default/token")
                .header("Metadata-Flavor", "Google");
            then.status(200).json_body(json!({
                "access_token": "metadata-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        })
        .await
}

#[tokio::test]
async fn test_gcp_secret_is_decoded() -> Result<()> {
    let server = MockServer::start_async().await;
    let metadata = mock_metadata(&server).await;
    mock_secret(&server, "notion-api-key", "secret_abc").await;

    let manager = GcpSecretManager::new(reqwest::Client::new(), "test-project")?
        .with_base_url(server.url("/secretmanager"))
        .with_metadata_url(server.base_url());

    assert_eq!(manager.get_secret("notion-api-key").await?, "secret_abc");
    metadata.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_missing_gcp_secret_is_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/secrets/");
            then.status(404).body("Secret not found");
        })
        .await;

    let manager = GcpSecretManager::new(reqwest::Client::new(), "test-project")?
        .with_base_url(server.url("/secretmanager"))
        .with_access_token("static-token");

    let err = manager.get_secret("todoist-api-key").await.unwrap_err();
    match err {
        SyncError::SecretNotFoundError { secret_id } => assert_eq!(secret_id, "todoist-api-key"),
        other => panic!("expected a missing secret, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_secret_manager_outage_is_secret_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/secrets/");
            then.status(503).body("backend unavailable");
        })
        .await;

    let manager = GcpSecretManager::new(reqwest::Client::new(), "test-project")?
        .with_base_url(server.url("/secretmanager"))
        .with_access_token("static-token");

    match manager.get_secret("notion-api-key").await.unwrap_err() {
        SyncError::SecretError { secret_id, message } => {
            assert_eq!(secret_id, "notion-api-key");
            assert!(message.contains("503"));
        }
        other => panic!("expected secret error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_sync_with_gcp_credentials() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_metadata(&server).await;
    mock_secret(&server, "todoist-api-key", TODOIST_KEY).await;
    mock_secret(&server, "notion-api-key", NOTION_KEY).await;
    mock_secret(&server, "notion-database-id", PROJECTS_DB).await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v2/projects")
                .header("Authorization", "Bearer fake_todoist_key");
            then.status(200).json_body(json!([]));
        })
        .await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/databases/fake_db_id/query")
                .header("Authorization", "Bearer fake_notion_key");
            then.status(200).json_body(json!({"results": []}));
        })
        .await;

    let mut config = config_for(&server, MatchStrategy::TodoistId);
    config.todoist.api_key = None;
    config.notion.api_key = None;
    config.secrets.provider = SecretsProviderKind::Gcp;
    config.secrets.gcp_project = Some("test-project".to_string());
    config.secrets.secret_manager_url = Some(server.url("/secretmanager"));
    config.secrets.metadata_url = Some(server.base_url());

    let response = run_action(&config, MemoryStorage::new(), Action::Projects).await;

    query.assert_async().await;
    assert_eq!(response.status_code, 200);
    let body = sync_body(response);
    assert_eq!(
        body.message,
        "Sync complete! Checked: 0, Created: 0, Updated: 0. Encountered 0 error(s)."
    );
    Ok(())
}

async fn mock_sync_secrets(server: &MockServer) {
    mock_metadata(server).await;
    mock_secret(server, "todoist-api-key", TODOIST_KEY).await;
    mock_secret(server, "notion-api-key", NOTION_KEY).await;
    mock_secret(server, "notion-database-id", PROJECTS_DB).await;
}

fn gcp_config(server: &MockServer) -> todoist_notion_sync::AppConfig {
    let mut config = config_for(server, MatchStrategy::TodoistId);
    config.todoist.api_key = None;
    config.notion.api_key = None;
    config.notion.tasks_database_id = None;
    config.secrets.provider = SecretsProviderKind::Gcp;
    config.secrets.gcp_project = Some("test-project".to_string());
    config.secrets.secret_manager_url = Some(server.url("/secretmanager"));
    config.secrets.metadata_url = Some(server.base_url());
    config
}

#[tokio::test]
async fn test_tasks_database_outage_is_not_reported_as_missing() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_sync_secrets(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/secretmanager/projects/test-project/secrets/notion-tasks-database-id/versions/latest:access");
            then.status(500).body("internal error");
        })
        .await;
    let todoist = server
        .mock_async(|when, then| {
            when.path_contains("/rest/v2/");
            then.status(200).json_body(json!([]));
        })
        .await;

    let response = run_action(&gcp_config(&server), MemoryStorage::new(), Action::Tasks).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(todoist.hits_async().await, 0);
    let body = sync_body(response);
    assert!(body.message.contains("notion-tasks-database-id"));
    assert!(!body.message.contains("Missing configuration"));
    Ok(())
}

#[tokio::test]
async fn test_absent_tasks_database_secret_is_bad_request() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_sync_secrets(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/secretmanager/projects/test-project/secrets/notion-tasks-database-id/versions/latest:access");
            then.status(404).body("Secret not found");
        })
        .await;

    let response = run_action(&gcp_config(&server), MemoryStorage::new(), Action::Tasks).await;

    assert_eq!(response.status_code, 400);
    assert_eq!(
        sync_body(response).message,
        "Missing configuration: notion-tasks-database-id"
    );
    Ok(())
}
