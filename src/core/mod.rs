pub mod apply;
pub mod batch_update;
pub mod engine;
pub mod mapping;
pub mod project_sync;
pub mod task_sync;

pub use crate::domain::model::{SyncAction, SyncOptions, SyncPlan, SyncReport};
pub use crate::domain::ports::{SecretProvider, Storage, SyncPipeline};
pub use crate::utils::error::Result;
