use crate::{
    error::RunError,
    sink::{OutcomeSink, TracingSink},
};
use chrono::Utc;
use engine_core::{
    connectors::{destination::DestinationStore, source::RowSource},
    load::LoadStrategy,
    metrics::Metrics,
    state::CheckpointStore,
    watermark,
};
use model::{execution::outcome::RunOutcome, task::spec::TaskSpec};
use planner::{SelectSpec, build_select};
use std::{sync::Arc, time::Instant};
use tokio::time;
use tracing::{debug, info, warn};

/// Executes one run of one task: read checkpoint, plan, fetch, load, advance
/// the checkpoint.
pub struct TaskRunner {
    source: Arc<dyn RowSource>,
    destination: Arc<dyn DestinationStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    sinks: Vec<Arc<dyn OutcomeSink>>,
    metrics: Metrics,
}

impl TaskRunner {
    pub fn new(
        source: Arc<dyn RowSource>,
        destination: Arc<dyn DestinationStore>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        TaskRunner {
            source,
            destination,
            checkpoints,
            sinks: vec![Arc::new(TracingSink)],
            metrics: Metrics::new(),
        }
    }

    /// Adds a sink next to the built-in log sink.
    pub fn with_sink(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Runs the task under its timeout. Never fails: errors end up in
    /// [`RunOutcome::error`] and the checkpoint stays where it was.
    pub async fn run(&self, task: &TaskSpec) -> RunOutcome {
        let started = Instant::now();
        let mut outcome = RunOutcome::new(task.name.clone(), Utc::now());
        self.metrics.increment_started();

        let result = match time::timeout(task.timeout, self.execute(task, &mut outcome)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(task = %task.name, timeout = ?task.timeout, "Run timed out, abandoning in-flight work");
                Err(RunError::Timeout(task.timeout))
            }
        };

        outcome.duration_ms = started.elapsed().as_millis() as u64;
        self.metrics
            .add_rows(outcome.rows_loaded as u64, outcome.rows_skipped as u64);
        match result {
            Ok(()) => self.metrics.increment_succeeded(),
            Err(err) => {
                self.metrics.increment_failed();
                outcome.checkpoint = None;
                outcome.error = Some(err.to_string());
            }
        }

        for sink in &self.sinks {
            sink.publish(&outcome);
        }
        outcome
    }

    async fn execute(&self, task: &TaskSpec, outcome: &mut RunOutcome) -> Result<(), RunError> {
        let previous = match &task.tracking {
            Some(tracking) => self
                .checkpoints
                .get(&tracking.checkpoint_key)
                .await?
                .filter(|value| !value.is_empty()),
            None => None,
        };

        let columns = task.columns();
        let plan = build_select(&SelectSpec {
            table: &task.table,
            columns: &columns,
            filter: task.filter.as_deref(),
            tracking: task.tracking.as_ref(),
            last_checkpoint: previous.as_deref(),
        })?;
        outcome.first_run = plan.first_run;

        if task.log_sql {
            info!(task = %task.name, sql = %plan.sql, args = ?plan.args, "Executing query");
        } else {
            debug!(task = %task.name, sql = %plan.sql, "Executing query");
        }

        let rows = self.source.query(&plan.sql, &plan.args).await?;
        outcome.rows_fetched = rows.len();

        let strategy = LoadStrategy::for_task(task);
        let stats = strategy
            .apply(&rows, &task.destination_key, self.destination.as_ref())
            .await
            .inspect_err(|err| outcome.rows_loaded = err.loaded)?;
        outcome.rows_loaded = stats.loaded;
        outcome.rows_skipped = stats.skipped;

        if let Some(tracking) = &task.tracking {
            outcome.checkpoint = watermark::advance(
                self.checkpoints.as_ref(),
                tracking,
                &rows,
                previous.as_deref(),
            )
            .await?;
            if let Some(checkpoint) = &outcome.checkpoint
                && previous.as_deref() != Some(checkpoint.as_str())
            {
                debug!(task = %task.name, key = %tracking.checkpoint_key, %checkpoint, "Checkpoint advanced");
            }
        }
        Ok(())
    }
}
