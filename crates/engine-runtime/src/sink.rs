use model::execution::outcome::RunOutcome;
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

/// Receives every finished execution.
pub trait OutcomeSink: Send + Sync {
    fn publish(&self, outcome: &RunOutcome);
}

/// Logs outcomes as structured events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn publish(&self, outcome: &RunOutcome) {
        match &outcome.error {
            None => info!(
                task = %outcome.task,
                first_run = outcome.first_run,
                fetched = outcome.rows_fetched,
                loaded = outcome.rows_loaded,
                skipped = outcome.rows_skipped,
                checkpoint = outcome.checkpoint.as_deref().unwrap_or("-"),
                duration_ms = outcome.duration_ms,
                "Task run completed"
            ),
            Some(err) => error!(
                task = %outcome.task,
                fetched = outcome.rows_fetched,
                loaded = outcome.rows_loaded,
                duration_ms = outcome.duration_ms,
                error = %err,
                "Task run failed"
            ),
        }
    }
}

/// Keeps outcomes in memory, in publish order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    outcomes: Mutex<Vec<RunOutcome>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<RunOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutcomeSink for CollectingSink {
    fn publish(&self, outcome: &RunOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
    }
}
