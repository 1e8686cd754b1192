use crate::config::toml_config::AppConfig;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, SyncError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client as S3Client;

pub const DEFAULT_MAPPING_REGION: &str = "ap-southeast-2";

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub app: AppConfig,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        let app = AppConfig::from_env_vars(|key| std::env::var(key).ok())?;
        Ok(Self { app })
    }

    pub fn mapping_region(&self) -> String {
        self.app
            .storage
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_MAPPING_REGION.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                return match err.into_service_error() {
                    GetObjectError::NoSuchKey(_) => Ok(None),
                    other => Err(SyncError::StorageError {
                        message: format!("Failed to read s3://{}/{}: {}", self.bucket, path, other),
                    }),
                }
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| SyncError::StorageError {
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(Some(data.into_bytes().to_vec()))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type("application/json")
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| SyncError::StorageError {
                message: format!(
                    "Failed to write s3://{}/{}: {}",
                    self.bucket,
                    path,
                    e.into_service_error()
                ),
            })?;
        Ok(())
    }
}
