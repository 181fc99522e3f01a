use engine_core::memory::{MemoryCheckpointStore, MemoryDestination, StaticRowSource};
use engine_runtime::{runner::TaskRunner, sink::CollectingSink};
use model::{core::value::Value, records::row::Row};
use std::sync::Arc;

/// Runner wired to in-memory collaborators, with handles kept for assertions.
pub struct Harness {
    pub source: Arc<StaticRowSource>,
    pub destination: Arc<MemoryDestination>,
    pub checkpoints: Arc<MemoryCheckpointStore>,
    pub sink: Arc<CollectingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_destination(MemoryDestination::new())
    }

    pub fn with_destination(destination: MemoryDestination) -> Self {
        Harness {
            source: Arc::new(StaticRowSource::new()),
            destination: Arc::new(destination),
            checkpoints: Arc::new(MemoryCheckpointStore::new()),
            sink: Arc::new(CollectingSink::new()),
        }
    }

    pub fn runner(&self) -> TaskRunner {
        TaskRunner::new(
            self.source.clone(),
            self.destination.clone(),
            self.checkpoints.clone(),
        )
        .with_sink(self.sink.clone())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
