use connectors::{redis::RedisError, sql::error::DbError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Source query failed: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum DestinationError {
    #[error(transparent)]
    Redis(#[from] RedisError),

    #[error("Destination write rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error(transparent)]
    Redis(#[from] RedisError),

    #[error("Checkpoint storage error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Failed to decode checkpoint record: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Checkpoint store error: {0}")]
    Other(String),
}

/// A destination write failed. Rows written before the failure stay written.
#[derive(Error, Debug)]
#[error("Load into {key:?} failed after {loaded} rows: {source}")]
pub struct LoadError {
    pub key: String,
    pub loaded: usize,
    #[source]
    pub source: DestinationError,
}

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("Tracking column {column:?} mixes {left} and {right} values")]
    IncomparableTypes {
        column: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("Stored checkpoint {value:?} cannot be read as {expected}")]
    UndecodableCheckpoint {
        value: String,
        expected: &'static str,
    },

    #[error("Failed to persist checkpoint: {0}")]
    Persist(#[from] CheckpointError),
}
