//! Fires task executions on their schedules.
//!
//! Each task gets its own fire loop. A fire spawns the execution and returns
//! immediately, so a slow task never delays the others. Overlap within one
//! task is prevented by the execution token on its [`TaskHandle`]: a fire that
//! finds the token taken is skipped.

use crate::{error::SchedulerError, runner::TaskRunner};
use chrono::{DateTime, Utc};
use engine_config::schedule::{Schedule, ScheduleParser};
use engine_core::metrics::Metrics;
use model::{core::identifiers::TaskName, execution::outcome::RunOutcome, task::spec::TaskSpec};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{info, warn};

/// A registered task: immutable spec, parsed schedule, execution token.
#[derive(Debug)]
pub struct TaskHandle {
    spec: TaskSpec,
    schedule: Schedule,
    running: AtomicBool,
}

impl TaskHandle {
    fn new(spec: TaskSpec, schedule: Schedule) -> Self {
        TaskHandle {
            spec,
            schedule,
            running: AtomicBool::new(false),
        }
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Takes the execution token, or `None` if an execution is in flight.
    fn try_acquire(self: &Arc<Self>) -> Option<ExecutionToken> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExecutionToken {
                handle: Arc::clone(self),
            })
    }
}

/// Held for the duration of one execution; released on drop, including when
/// the execution is cancelled.
struct ExecutionToken {
    handle: Arc<TaskHandle>,
}

impl Drop for ExecutionToken {
    fn drop(&mut self) {
        self.handle.running.store(false, Ordering::Release);
    }
}

/// Task name → handle, in registration order.
#[derive(Debug, Default)]
pub struct TaskIndex {
    order: Vec<TaskName>,
    handles: HashMap<TaskName, Arc<TaskHandle>>,
}

impl TaskIndex {
    pub fn build(tasks: Vec<TaskSpec>, parser: &ScheduleParser) -> Result<Self, SchedulerError> {
        let mut index = TaskIndex::default();
        for spec in tasks {
            let schedule =
                parser
                    .parse(&spec.schedule)
                    .map_err(|source| SchedulerError::InvalidSchedule {
                        task: spec.name.to_string(),
                        source,
                    })?;
            let name = spec.name.clone();
            if index.handles.contains_key(&name) {
                return Err(SchedulerError::DuplicateTask(name.to_string()));
            }
            index
                .handles
                .insert(name.clone(), Arc::new(TaskHandle::new(spec, schedule)));
            index.order.push(name);
        }
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TaskHandle>> {
        self.handles.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TaskHandle>> {
        self.order.iter().filter_map(|name| self.handles.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub struct Scheduler {
    index: Arc<TaskIndex>,
    runner: Arc<TaskRunner>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    started: AtomicBool,
}

impl Scheduler {
    pub fn new(
        tasks: Vec<TaskSpec>,
        parser: &ScheduleParser,
        runner: TaskRunner,
    ) -> Result<Self, SchedulerError> {
        Ok(Scheduler {
            index: Arc::new(TaskIndex::build(tasks, parser)?),
            runner: Arc::new(runner),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            started: AtomicBool::new(false),
        })
    }

    pub fn tasks(&self) -> &TaskIndex {
        &self.index
    }

    pub fn metrics(&self) -> &Metrics {
        self.runner.metrics()
    }

    /// Spawns one fire loop per task and returns.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.cancel.is_cancelled() {
            return Err(SchedulerError::Stopped);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyStarted);
        }

        for handle in self.index.iter() {
            info!(task = %handle.spec.name, schedule = %handle.spec.schedule, "Scheduling task");
            self.tracker.spawn(fire_loop(
                Arc::clone(handle),
                Arc::clone(&self.runner),
                self.tracker.clone(),
                self.cancel.clone(),
            ));
        }
        info!(tasks = self.index.len(), "Scheduler started");
        Ok(())
    }

    /// Ends every fire loop and cancels in-flight executions at their next
    /// await point, then waits for them to wind down.
    pub async fn stop(&self) {
        info!("Stopping scheduler");
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        info!("Scheduler stopped");
    }

    /// Executes a task immediately, outside its schedule. Fails with
    /// [`SchedulerError::Busy`] if the task is already running.
    pub async fn run_now(&self, name: &str) -> Result<RunOutcome, SchedulerError> {
        let handle = self
            .index
            .get(name)
            .ok_or_else(|| SchedulerError::UnknownTask(name.to_string()))?;
        let _token = handle
            .try_acquire()
            .ok_or_else(|| SchedulerError::Busy(name.to_string()))?;

        tokio::select! {
            _ = self.cancel.cancelled() => Err(SchedulerError::Stopped),
            outcome = self.runner.run(&handle.spec) => Ok(outcome),
        }
    }
}

async fn fire_loop(
    handle: Arc<TaskHandle>,
    runner: Arc<TaskRunner>,
    tracker: TaskTracker,
    cancel: CancellationToken,
) {
    match &handle.schedule {
        Schedule::Every(interval) => {
            let mut ticker = time::interval_at(Instant::now() + *interval, *interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => fire(&handle, &runner, &tracker, &cancel),
                }
            }
        }
        Schedule::Cron(_) => {
            let mut previous = Utc::now();
            loop {
                let Some(next) = next_fire(&handle.schedule, previous, Utc::now()) else {
                    warn!(task = %handle.spec.name, "Schedule has no future fire times");
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = time::sleep(wait) => {
                        fire(&handle, &runner, &tracker, &cancel);
                        previous = next;
                    }
                }
            }
        }
    }
}

/// Fire time following `previous`. A sleep that wakes a little early still
/// moves on to the next slot; slots already behind `now` are skipped.
fn next_fire(
    schedule: &Schedule,
    previous: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let next = schedule.next_after(previous)?;
    if next < now {
        schedule.next_after(now)
    } else {
        Some(next)
    }
}

fn fire(
    handle: &Arc<TaskHandle>,
    runner: &Arc<TaskRunner>,
    tracker: &TaskTracker,
    cancel: &CancellationToken,
) {
    let Some(token) = handle.try_acquire() else {
        runner.metrics().increment_skipped_fires();
        warn!(task = %handle.spec.name, "Previous execution still running, skipping this fire");
        return;
    };

    let handle = Arc::clone(handle);
    let runner = Arc::clone(runner);
    let cancel = cancel.clone();
    tracker.spawn(async move {
        let _token = token;
        tokio::select! {
            _ = cancel.cancelled() => {
                warn!(task = %handle.spec.name, "Execution cancelled by shutdown");
            }
            _ = runner.run(&handle.spec) => {}
        }
    });
}
