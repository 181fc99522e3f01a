use crate::error::CliError;
use async_trait::async_trait;
use connectors::{redis::RedisClient, sql::postgres::adapter::PgAdapter};
use engine_config::settings::{
    AppConfig, CheckpointBackend, PostgresSettings, RedisSettings,
};
use engine_core::state::{CheckpointStore, sled_store::SledCheckpointStore};
use engine_runtime::runner::TaskRunner;
use std::sync::Arc;
use tracing::{error, info};

/// Trait for "pinging" a service
#[async_trait]
pub trait ConnectionPinger {
    fn name(&self) -> &'static str;

    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

pub struct PostgresPinger {
    pub settings: PostgresSettings,
}

pub struct RedisPinger {
    pub settings: RedisSettings,
}

#[async_trait]
impl ConnectionPinger for PostgresPinger {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), CliError> {
        info!(postgres = %self.settings, "Pinging Postgres");
        let adapter = PgAdapter::connect(&self.settings.conninfo())
            .await
            .inspect_err(|e| error!(postgres = %self.settings, error = %e, "Postgres connection failed"))?;
        adapter.ping().await?;
        info!(postgres = %self.settings, "Postgres ping succeeded");
        Ok(())
    }
}

#[async_trait]
impl ConnectionPinger for RedisPinger {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), CliError> {
        info!(addr = %self.settings.addr, "Pinging Redis");
        let client = RedisClient::connect(self.settings.options())
            .await
            .inspect_err(|e| error!(addr = %self.settings.addr, error = %e, "Redis connection failed"))?;
        client.ping().await?;
        info!(addr = %self.settings.addr, "Redis ping succeeded");
        Ok(())
    }
}

/// Connects to both services and opens the configured checkpoint store.
pub async fn build_runner(config: &AppConfig) -> Result<TaskRunner, CliError> {
    let source = PgAdapter::connect(&config.postgres.conninfo()).await?;
    info!(postgres = %config.postgres, "Connected to Postgres");
    let redis = RedisClient::connect(config.redis.options()).await?;
    info!(addr = %config.redis.addr, db = config.redis.db, "Connected to Redis");

    let checkpoints = open_checkpoints(config, &redis)?;
    Ok(TaskRunner::new(
        Arc::new(source),
        Arc::new(redis),
        checkpoints,
    ))
}

/// Opens only the checkpoint store, connecting to Redis when it is the
/// backend.
pub async fn checkpoint_store(config: &AppConfig) -> Result<Arc<dyn CheckpointStore>, CliError> {
    match config.checkpoints.backend {
        CheckpointBackend::Redis => {
            let redis = RedisClient::connect(config.redis.options()).await?;
            open_checkpoints(config, &redis)
        }
        CheckpointBackend::Sled => open_sled(config),
    }
}

fn open_checkpoints(
    config: &AppConfig,
    redis: &RedisClient,
) -> Result<Arc<dyn CheckpointStore>, CliError> {
    match config.checkpoints.backend {
        CheckpointBackend::Redis => Ok(Arc::new(redis.clone())),
        CheckpointBackend::Sled => open_sled(config),
    }
}

fn open_sled(config: &AppConfig) -> Result<Arc<dyn CheckpointStore>, CliError> {
    // The validator guarantees a path for the sled backend.
    let path = config.checkpoints.path.clone().unwrap_or_default();
    let store = SledCheckpointStore::open(&path)?;
    info!(path = %path.display(), "Opened sled checkpoint store");
    Ok(Arc::new(store))
}
