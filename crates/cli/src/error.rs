use connectors::{redis::RedisError, sql::error::DbError};
use engine_config::error::ConfigError;
use engine_core::error::CheckpointError;
use engine_runtime::error::SchedulerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// PostgreSQL driver error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] DbError),

    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Checkpoint store error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("No task named {0:?} in the configuration")]
    UnknownTask(String),

    #[error("Task {0:?} has no tracking column, so it keeps no checkpoint")]
    UntrackedTask(String),
}
