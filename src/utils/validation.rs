use crate::utils::error::{Result, SyncError};
use chrono::NaiveDate;
use url::Url;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SyncError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SyncError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// API keys end up in an `Authorization: Bearer` header, so stray whitespace
/// (a trailing newline from a secrets file is the usual culprit) is rejected
/// here rather than surfacing as an opaque request builder error.
pub fn validate_api_key(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "<redacted>".to_string(),
            reason: "API key contains whitespace or control characters".to_string(),
        });
    }
    Ok(())
}

/// `Notion-Version` is a release date such as `2022-06-28`.
pub fn validate_notion_version(field_name: &str, value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a YYYY-MM-DD API version".to_string(),
        })
}

pub fn validate_timeout_secs(field_name: &str, secs: u64) -> Result<()> {
    if secs == 0 || secs > MAX_REQUEST_TIMEOUT_SECS {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: secs.to_string(),
            reason: format!(
                "Timeout must be between 1 and {} seconds",
                MAX_REQUEST_TIMEOUT_SECS
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("notion.base_url", "https://api.notion.com/v1").is_ok());
        assert!(validate_url("notion.base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("notion.base_url", "").is_err());
        assert!(validate_url("notion.base_url", "invalid-url").is_err());
        assert!(validate_url("notion.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("storage.path", "./.sync-state").is_ok());
        assert!(validate_path("storage.path", "").is_err());
        assert!(validate_path("storage.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("db".to_string());
        let missing: Option<String> = None;
        assert_eq!(validate_required_field("id", &present).unwrap(), "db");
        assert!(matches!(
            validate_required_field("id", &missing),
            Err(SyncError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("gcp_project", "my-project").is_ok());
        assert!(validate_non_empty_string("gcp_project", "   ").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("todoist.api_key", "0123456789abcdef").is_ok());
        assert!(validate_api_key("notion.api_key", "secret_abc\n").is_err());
        assert!(validate_api_key("notion.api_key", "").is_err());

        let err = validate_api_key("notion.api_key", "secret abc").unwrap_err();
        assert!(!err.to_string().contains("secret abc"));
    }

    #[test]
    fn test_validate_notion_version() {
        assert!(validate_notion_version("notion.version", "2022-06-28").is_ok());
        assert!(validate_notion_version("notion.version", "latest").is_err());
    }

    #[test]
    fn test_validate_timeout_secs() {
        assert!(validate_timeout_secs("sync.request_timeout_secs", 30).is_ok());
        assert!(validate_timeout_secs("sync.request_timeout_secs", 0).is_err());
        assert!(validate_timeout_secs("sync.request_timeout_secs", 3600).is_err());
    }
}
