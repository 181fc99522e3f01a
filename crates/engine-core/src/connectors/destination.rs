use crate::error::DestinationError;
use async_trait::async_trait;
use connectors::redis::RedisClient;

/// Write operations of the key-value destination, one per structure kind.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), DestinationError>;

    /// Appends to the tail of the list.
    async fn list_push(&self, key: &str, value: &str) -> Result<(), DestinationError>;

    async fn set_add(&self, key: &str, member: &str) -> Result<(), DestinationError>;

    async fn sorted_set_add(
        &self,
        key: &str,
        score: f64,
        member: &str,
    ) -> Result<(), DestinationError>;

    /// Appends one entry; field order is preserved.
    async fn stream_append(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<(), DestinationError>;
}

#[async_trait]
impl DestinationStore for RedisClient {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), DestinationError> {
        self.hset(key, field, value).await?;
        Ok(())
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<(), DestinationError> {
        self.rpush(key, value).await?;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), DestinationError> {
        self.sadd(key, member).await?;
        Ok(())
    }

    async fn sorted_set_add(
        &self,
        key: &str,
        score: f64,
        member: &str,
    ) -> Result<(), DestinationError> {
        self.zadd(key, score, member).await?;
        Ok(())
    }

    async fn stream_append(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<(), DestinationError> {
        self.xadd(key, fields).await?;
        Ok(())
    }
}
