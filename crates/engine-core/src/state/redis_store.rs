use crate::{error::CheckpointError, state::CheckpointStore};
use async_trait::async_trait;
use connectors::redis::RedisClient;

/// Checkpoints live next to the replicated data as plain string keys.
#[async_trait]
impl CheckpointStore for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CheckpointError> {
        Ok(RedisClient::get(self, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CheckpointError> {
        Ok(RedisClient::set(self, key, value).await?)
    }
}
