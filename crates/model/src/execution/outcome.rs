use crate::core::identifiers::TaskName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result record of one task execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcome {
    pub task: TaskName,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub first_run: bool,
    pub rows_fetched: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    /// Checkpoint written by this run, if any.
    pub checkpoint: Option<String>,
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn new(task: TaskName, started_at: DateTime<Utc>) -> Self {
        RunOutcome {
            task,
            started_at,
            duration_ms: 0,
            first_run: false,
            rows_fetched: 0,
            rows_loaded: 0,
            rows_skipped: 0,
            checkpoint: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task={} fetched={} loaded={} skipped={} checkpoint={} ",
            self.task,
            self.rows_fetched,
            self.rows_loaded,
            self.rows_skipped,
            self.checkpoint.as_deref().unwrap_or("-"),
        )?;
        match &self.error {
            Some(err) => write!(f, "error={err}"),
            None => write!(f, "ok ({} ms)", self.duration_ms),
        }
    }
}
