use crate::{
    error::CheckpointError,
    state::{CheckpointStore, models::CheckpointRecord},
};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Local checkpoint store for deployments that keep replication state off
/// the destination.
pub struct SledCheckpointStore {
    db: sled::Db,
}

impl SledCheckpointStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn chk_key(key: &str) -> String {
        format!("chk:{key}")
    }

    /// Full record including the time of the last write.
    pub fn record(&self, key: &str) -> Result<Option<CheckpointRecord>, CheckpointError> {
        match self.db.get(Self::chk_key(key))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CheckpointStore for SledCheckpointStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CheckpointError> {
        Ok(self.record(key)?.map(|record| record.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CheckpointError> {
        let record = CheckpointRecord {
            value: value.to_string(),
            updated_at: chrono::Utc::now(),
        };
        let bytes = bincode::serialize(&record)?;
        self.db.insert(Self::chk_key(key), bytes)?;
        self.db.flush_async().await?;
        debug!(key, value, "Checkpoint stored");
        Ok(())
    }
}
