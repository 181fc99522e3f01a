use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Checkpoint as persisted by the local store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckpointRecord {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
