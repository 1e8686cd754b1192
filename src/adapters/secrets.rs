use crate::adapters::ensure_success;
use crate::domain::ports::SecretProvider;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

pub const TODOIST_API_KEY_SECRET_ID: &str = "todoist-api-key";
pub const NOTION_API_KEY_SECRET_ID: &str = "notion-api-key";
pub const NOTION_DATABASE_ID_SECRET_ID: &str = "notion-database-id";
pub const NOTION_TASKS_DATABASE_ID_SECRET_ID: &str = "notion-tasks-database-id";

pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com/v1";
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

/// `notion-api-key` -> `NOTION_API_KEY`
pub fn env_var_name(secret_id: &str) -> String {
    secret_id.replace('-', "_").to_uppercase()
}

#[derive(Debug, Clone, Default)]
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(&self, secret_id: &str) -> Result<String> {
        match std::env::var(env_var_name(secret_id)) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Err(SyncError::SecretNotFoundError {
                secret_id: secret_id.to_string(),
            }),
            Err(e) => Err(SyncError::SecretError {
                secret_id: secret_id.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, secret_id: &str, value: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.to_string(), value.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn get_secret(&self, secret_id: &str) -> Result<String> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SyncError::SecretNotFoundError {
                secret_id: secret_id.to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google Secret Manager over REST, reading the `latest` version of each
/// secret.
#[derive(Debug, Clone)]
pub struct GcpSecretManager {
    client: Client,
    project: String,
    base_url: String,
    metadata_url: String,
    access_token: Option<String>,
}

impl GcpSecretManager {
    pub fn new(client: Client, project: impl Into<String>) -> Result<Self> {
        let project = project.into();
        if project.trim().is_empty() {
            return Err(SyncError::GcpProjectNotSetError);
        }
        Ok(Self {
            client,
            project,
            base_url: DEFAULT_SECRET_MANAGER_URL.to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            access_token: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_metadata_url(mut self, metadata_url: impl Into<String>) -> Self {
        self.metadata_url = metadata_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Skips the metadata server lookup.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    async fn token(&self) -> Result<String> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.metadata_url
        );
        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;
        let token: TokenResponse = ensure_success("GCP metadata", response).await?.json().await?;
        Ok(token.access_token)
    }

    async fn access(&self, secret_id: &str) -> Result<String> {
        let url = format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            self.base_url, self.project, secret_id
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token().await?)
            .send()
            .await?;
        let body: AccessResponse = ensure_success("Secret Manager", response).await?.json().await?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body.payload.data.trim())
            .map_err(|e| SyncError::SecretError {
                secret_id: secret_id.to_string(),
                message: format!("payload is not valid base64: {}", e),
            })?;
        String::from_utf8(bytes).map_err(|e| SyncError::SecretError {
            secret_id: secret_id.to_string(),
            message: format!("payload is not UTF-8: {}", e),
        })
    }
}

#[async_trait]
impl SecretProvider for GcpSecretManager {
    async fn get_secret(&self, secret_id: &str) -> Result<String> {
        self.access(secret_id).await.map_err(|e| {
            tracing::error!(
                "Error accessing secret '{}' in project '{}': {}",
                secret_id,
                self.project,
                e
            );
            match e {
                SyncError::SecretError { .. } => e,
                SyncError::HttpStatusError { status: 404, .. } => SyncError::SecretNotFoundError {
                    secret_id: secret_id.to_string(),
                },
                other => SyncError::SecretError {
                    secret_id: secret_id.to_string(),
                    message: other.to_string(),
                },
            }
        })
    }
}

/// Everything a run needs from the secret store.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub todoist_api_key: String,
    pub notion_api_key: String,
    pub projects_database_id: String,
    pub tasks_database_id: Option<String>,
}

impl Credentials {
    pub async fn resolve<P: SecretProvider + ?Sized>(provider: &P) -> Result<Self> {
        let todoist_api_key = provider.get_secret(TODOIST_API_KEY_SECRET_ID).await?;
        let notion_api_key = provider.get_secret(NOTION_API_KEY_SECRET_ID).await?;
        let projects_database_id = provider.get_secret(NOTION_DATABASE_ID_SECRET_ID).await?;
        let tasks_database_id = match provider
            .get_secret(NOTION_TASKS_DATABASE_ID_SECRET_ID)
            .await
        {
            Ok(id) => Some(id),
            Err(SyncError::SecretNotFoundError { .. }) => {
                tracing::debug!("No tasks database configured");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            todoist_api_key,
            notion_api_key,
            projects_database_id,
            tasks_database_id,
        })
    }

    pub fn require_tasks_database(&self) -> Result<&str> {
        self.tasks_database_id
            .as_deref()
            .ok_or_else(|| SyncError::MissingConfigError {
                field: NOTION_TASKS_DATABASE_ID_SECRET_ID.to_string(),
            })
    }
}
