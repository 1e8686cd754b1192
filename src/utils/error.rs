use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{service} API returned {status}: {body}")]
    HttpStatusError {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Error accessing secret '{secret_id}': {message}")]
    SecretError { secret_id: String, message: String },

    #[error("GCP_PROJECT environment variable not set.")]
    GcpProjectNotSetError,

    #[error("Secret '{secret_id}' does not exist")]
    SecretNotFoundError { secret_id: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Instruction error: {message}")]
    InstructionError { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequestError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Secrets,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn config(message: impl Into<String>) -> Self {
        SyncError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::ApiError(_) | SyncError::HttpStatusError { .. } => ErrorCategory::Network,
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            SyncError::SecretError { .. }
            | SyncError::SecretNotFoundError { .. }
            | SyncError::GcpProjectNotSetError => ErrorCategory::Secrets,
            SyncError::IoError(_) | SyncError::StorageError { .. } => ErrorCategory::Storage,
            SyncError::SerializationError(_)
            | SyncError::InstructionError { .. }
            | SyncError::InvalidRequestError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::InstructionError { .. } | SyncError::InvalidRequestError { .. } => {
                ErrorSeverity::Low
            }
            SyncError::ApiError(_) => ErrorSeverity::Medium,
            SyncError::HttpStatusError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            SyncError::HttpStatusError { .. }
            | SyncError::SerializationError(_)
            | SyncError::StorageError { .. }
            | SyncError::IoError(_) => ErrorSeverity::High,
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::SecretError { .. }
            | SyncError::SecretNotFoundError { .. }
            | SyncError::GcpProjectNotSetError => ErrorSeverity::Critical,
        }
    }

    /// HTTP status of the failed vendor call, if there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SyncError::HttpStatusError { status, .. } => Some(*status),
            SyncError::ApiError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Errors the caller can fix by changing what they sent.
    pub fn is_client_error(&self) -> bool {
        self.is_configuration()
            || matches!(
                self,
                SyncError::InstructionError { .. } | SyncError::InvalidRequestError { .. }
            )
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not talk to a remote service: {}", self),
            ErrorCategory::Configuration => format!("The configuration is not usable: {}", self),
            ErrorCategory::Secrets => format!("A credential could not be loaded: {}", self),
            ErrorCategory::Storage => format!("The id mapping store failed: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::HttpStatusError { status: 401, .. }
            | SyncError::HttpStatusError { status: 403, .. } => {
                "Check that the API key is valid and that the Notion integration is shared with the database"
            }
            SyncError::HttpStatusError { status: 404, .. } => {
                "Check the database id and that the integration has access to it"
            }
            SyncError::HttpStatusError { status: 429, .. } => "Rate limited, try again later",
            SyncError::ApiError(_) | SyncError::HttpStatusError { .. } => {
                "Check network connectivity and the service status, then rerun the sync"
            }
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. } => {
                "Review the configuration file and environment variables"
            }
            SyncError::GcpProjectNotSetError => {
                "Set GCP_PROJECT in the function environment or choose another secrets provider"
            }
            SyncError::SecretError { .. } | SyncError::SecretNotFoundError { .. } => {
                "Make sure the secret exists and the runtime identity may read it"
            }
            SyncError::IoError(_) | SyncError::StorageError { .. } => {
                "Check the mapping directory or bucket permissions"
            }
            SyncError::SerializationError(_) => "The stored mapping may be corrupt; delete it to rebuild",
            SyncError::InstructionError { .. } => "Rephrase the instruction",
            SyncError::InvalidRequestError { .. } => {
                "Send an action of projects, tasks or instructions"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
