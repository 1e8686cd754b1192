use crate::domain::model::{SyncPlan, SyncReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `path`.
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret(&self, secret_id: &str) -> Result<String>;
}

/// One sync direction: read both sides, decide what to do, then do it.
#[async_trait]
pub trait SyncPipeline: Send + Sync {
    type Snapshot: Send;

    fn name(&self) -> &'static str;
    async fn extract(&self) -> Result<Self::Snapshot>;
    async fn plan(&self, snapshot: Self::Snapshot) -> Result<SyncPlan>;
    async fn apply(&self, plan: SyncPlan) -> Result<SyncReport>;
}
