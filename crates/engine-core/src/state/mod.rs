use crate::error::CheckpointError;
use async_trait::async_trait;

mod models;
pub mod redis_store;
pub mod sled_store;

pub use models::CheckpointRecord;

/// Durable home of per-task checkpoints. Keys are owned by exactly one task.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CheckpointError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), CheckpointError>;
}
