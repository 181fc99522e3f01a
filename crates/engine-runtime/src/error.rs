use engine_config::error::ScheduleError;
use engine_core::error::{CheckpointError, LoadError, SourceError, WatermarkError};
use planner::PlanError;
use std::time::Duration;
use thiserror::Error;

/// Why a single execution failed. The checkpoint is never advanced when one
/// of these is returned.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to read checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Failed to plan query: {0}")]
    Plan(#[from] PlanError),

    #[error("Source query failed: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Watermark error: {0}")]
    Watermark(#[from] WatermarkError),

    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Unknown task {0:?}")]
    UnknownTask(String),

    #[error("Task {0:?} is already running")]
    Busy(String),

    #[error("Task {0:?} is registered twice")]
    DuplicateTask(String),

    #[error("Task {task:?} has an invalid schedule: {source}")]
    InvalidSchedule {
        task: String,
        #[source]
        source: ScheduleError,
    },

    #[error("Scheduler is already running")]
    AlreadyStarted,

    #[error("Scheduler has been stopped")]
    Stopped,
}
