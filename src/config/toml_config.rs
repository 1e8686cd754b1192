use crate::adapters::notion::{DEFAULT_NOTION_BASE_URL, DEFAULT_NOTION_VERSION};
use crate::adapters::secrets::{
    EnvSecretProvider, GcpSecretManager, StaticSecretProvider, NOTION_API_KEY_SECRET_ID,
    NOTION_DATABASE_ID_SECRET_ID, NOTION_TASKS_DATABASE_ID_SECRET_ID, TODOIST_API_KEY_SECRET_ID,
};
use crate::adapters::todoist::DEFAULT_TODOIST_BASE_URL;
use crate::domain::model::{MatchStrategy, SyncOptions};
use crate::domain::ports::SecretProvider;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub todoist: TodoistConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoistConfig {
    #[serde(default = "default_todoist_base_url")]
    pub base_url: String,
    /// Only read by the `config` secrets provider.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    #[serde(default = "default_notion_version")]
    pub version: String,
    pub api_key: Option<String>,
    pub projects_database_id: Option<String>,
    pub tasks_database_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretsProviderKind {
    /// `TODOIST_API_KEY`, `NOTION_API_KEY`, ... environment variables.
    #[default]
    Env,
    /// Google Secret Manager.
    Gcp,
    /// Keys written directly in this file.
    Config,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub provider: SecretsProviderKind,
    pub gcp_project: Option<String>,
    pub secret_manager_url: Option<String>,
    pub metadata_url: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub match_strategy: MatchStrategy,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Local,
    Memory,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub kind: StorageKind,
    #[serde(default = "default_storage_path")]
    pub path: String,
    pub bucket: Option<String>,
    pub region: Option<String>,
}

fn default_todoist_base_url() -> String {
    DEFAULT_TODOIST_BASE_URL.to_string()
}

fn default_notion_base_url() -> String {
    DEFAULT_NOTION_BASE_URL.to_string()
}

fn default_notion_version() -> String {
    DEFAULT_NOTION_VERSION.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_storage_path() -> String {
    "./.sync-state".to_string()
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            base_url: default_todoist_base_url(),
            api_key: None,
        }
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: default_notion_base_url(),
            version: default_notion_version(),
            api_key: None,
            projects_database_id: None,
            tasks_database_id: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            match_strategy: MatchStrategy::default(),
            dry_run: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            path: default_storage_path(),
            bucket: None,
            region: None,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// Builds a config from environment variables, the way the serverless
    /// trigger is configured. `lookup` is `std::env::var` outside tests.
    pub fn from_env_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(url) = lookup("TODOIST_BASE_URL") {
            config.todoist.base_url = url;
        }
        if let Some(url) = lookup("NOTION_BASE_URL") {
            config.notion.base_url = url;
        }
        if let Some(version) = lookup("NOTION_VERSION") {
            config.notion.version = version;
        }

        config.secrets.gcp_project = lookup("GCP_PROJECT").filter(|p| !p.is_empty());
        config.secrets.provider = match lookup("SECRETS_PROVIDER").as_deref() {
            Some("gcp") => SecretsProviderKind::Gcp,
            Some("env") => SecretsProviderKind::Env,
            Some(other) => {
                return Err(SyncError::InvalidConfigValueError {
                    field: "SECRETS_PROVIDER".to_string(),
                    value: other.to_string(),
                    reason: "Expected one of: env, gcp".to_string(),
                })
            }
            None if config.secrets.gcp_project.is_some() => SecretsProviderKind::Gcp,
            None => SecretsProviderKind::Env,
        };

        config.sync.match_strategy = match lookup("MATCH_STRATEGY").as_deref() {
            None | Some("todoist_id") => MatchStrategy::TodoistId,
            Some("name") => MatchStrategy::Name,
            Some(other) => {
                return Err(SyncError::InvalidConfigValueError {
                    field: "MATCH_STRATEGY".to_string(),
                    value: other.to_string(),
                    reason: "Expected one of: todoist_id, name".to_string(),
                })
            }
        };
        config.sync.dry_run = lookup("DRY_RUN")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS") {
            config.sync.request_timeout_secs =
                timeout
                    .parse()
                    .map_err(|_| SyncError::InvalidConfigValueError {
                        field: "REQUEST_TIMEOUT_SECS".to_string(),
                        value: timeout.clone(),
                        reason: "Expected a whole number of seconds".to_string(),
                    })?;
        }

        match lookup("MAPPING_BUCKET").filter(|b| !b.is_empty()) {
            Some(bucket) => {
                config.storage.kind = StorageKind::S3;
                config.storage.bucket = Some(bucket);
                config.storage.region = lookup("MAPPING_REGION");
            }
            None => config.storage.kind = StorageKind::Memory,
        }

        Ok(config)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            match_strategy: self.sync.match_strategy,
            dry_run: self.sync.dry_run,
        }
    }

    pub fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.sync.request_timeout_secs))
            .build()?)
    }

    pub fn secret_provider(&self, client: reqwest::Client) -> Result<Box<dyn SecretProvider>> {
        match self.secrets.provider {
            SecretsProviderKind::Env => Ok(Box::new(EnvSecretProvider)),
            SecretsProviderKind::Gcp => {
                let project = self.secrets.gcp_project.clone().unwrap_or_default();
                let mut manager = GcpSecretManager::new(client, project)?;
                if let Some(url) = &self.secrets.secret_manager_url {
                    manager = manager.with_base_url(url.clone());
                }
                if let Some(url) = &self.secrets.metadata_url {
                    manager = manager.with_metadata_url(url.clone());
                }
                if let Some(token) = &self.secrets.access_token {
                    manager = manager.with_access_token(token.clone());
                }
                Ok(Box::new(manager))
            }
            SecretsProviderKind::Config => {
                let mut provider = StaticSecretProvider::new();
                let entries = [
                    (TODOIST_API_KEY_SECRET_ID, &self.todoist.api_key),
                    (NOTION_API_KEY_SECRET_ID, &self.notion.api_key),
                    (NOTION_DATABASE_ID_SECRET_ID, &self.notion.projects_database_id),
                    (NOTION_TASKS_DATABASE_ID_SECRET_ID, &self.notion.tasks_database_id),
                ];
                for (secret_id, value) in entries {
                    if let Some(value) = value {
                        provider = provider.with_secret(secret_id, value.clone());
                    }
                }
                Ok(Box::new(provider))
            }
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("todoist.base_url", &self.todoist.base_url)?;
        validation::validate_url("notion.base_url", &self.notion.base_url)?;
        validation::validate_notion_version("notion.version", &self.notion.version)?;
        validation::validate_timeout_secs(
            "sync.request_timeout_secs",
            self.sync.request_timeout_secs,
        )?;

        match self.secrets.provider {
            SecretsProviderKind::Gcp => {
                if self
                    .secrets
                    .gcp_project
                    .as_deref()
                    .map_or(true, |p| p.trim().is_empty())
                {
                    return Err(SyncError::GcpProjectNotSetError);
                }
                if let Some(url) = &self.secrets.secret_manager_url {
                    validation::validate_url("secrets.secret_manager_url", url)?;
                }
            }
            SecretsProviderKind::Config => {
                let todoist_key =
                    validation::validate_required_field("todoist.api_key", &self.todoist.api_key)?;
                validation::validate_api_key("todoist.api_key", todoist_key)?;
                let notion_key =
                    validation::validate_required_field("notion.api_key", &self.notion.api_key)?;
                validation::validate_api_key("notion.api_key", notion_key)?;
                validation::validate_required_field(
                    "notion.projects_database_id",
                    &self.notion.projects_database_id,
                )?;
            }
            SecretsProviderKind::Env => {}
        }

        match self.storage.kind {
            StorageKind::Local => validation::validate_path("storage.path", &self.storage.path)?,
            StorageKind::S3 => {
                let bucket = validation::validate_required_field("storage.bucket", &self.storage.bucket)?;
                validation::validate_non_empty_string("storage.bucket", bucket)?;
            }
            StorageKind::Memory => {}
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
