//! In-process collaborators for tests and dry runs.

use crate::{
    connectors::{destination::DestinationStore, source::RowSource},
    error::{CheckpointError, DestinationError, SourceError},
    state::CheckpointStore,
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        lock(&self.values).insert(key.to_string(), value.to_string());
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    /// Makes every subsequent `set` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CheckpointError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CheckpointError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CheckpointError::Other(format!("write to {key:?} refused")));
        }
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One recorded destination write.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    HashSet {
        key: String,
        field: String,
        value: String,
    },
    ListPush {
        key: String,
        value: String,
    },
    SetAdd {
        key: String,
        member: String,
    },
    SortedSetAdd {
        key: String,
        score: f64,
        member: String,
    },
    StreamAppend {
        key: String,
        fields: Vec<(String, String)>,
    },
}

/// Destination that records writes in order and derives the resulting
/// structures from the log.
#[derive(Debug, Default)]
pub struct MemoryDestination {
    writes: Mutex<Vec<Write>>,
    fail_after: Option<usize>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `n` writes, then rejects every later one.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        lock(&self.writes).clone()
    }

    fn record(&self, write: Write) -> Result<(), DestinationError> {
        let mut writes = lock(&self.writes);
        if let Some(limit) = self.fail_after
            && writes.len() >= limit
        {
            return Err(DestinationError::Rejected(format!(
                "destination refused write #{}",
                writes.len() + 1
            )));
        }
        writes.push(write);
        Ok(())
    }

    pub fn hash(&self, key: &str) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for write in lock(&self.writes).iter() {
            if let Write::HashSet { key: k, field, value } = write
                && k == key
            {
                out.insert(field.clone(), value.clone());
            }
        }
        out
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        lock(&self.writes)
            .iter()
            .filter_map(|write| match write {
                Write::ListPush { key: k, value } if k == key => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Members in lexical order.
    pub fn set(&self, key: &str) -> Vec<String> {
        lock(&self.writes)
            .iter()
            .filter_map(|write| match write {
                Write::SetAdd { key: k, member } if k == key => Some(member.clone()),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Members ordered by score, then member. A re-added member takes its
    /// latest score.
    pub fn sorted_set(&self, key: &str) -> Vec<(String, f64)> {
        let mut scores: HashMap<String, f64> = HashMap::new();
        for write in lock(&self.writes).iter() {
            if let Write::SortedSetAdd {
                key: k,
                score,
                member,
            } = write
                && k == key
            {
                scores.insert(member.clone(), *score);
            }
        }
        let mut out: Vec<_> = scores.into_iter().collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    pub fn stream(&self, key: &str) -> Vec<Vec<(String, String)>> {
        lock(&self.writes)
            .iter()
            .filter_map(|write| match write {
                Write::StreamAppend { key: k, fields } if k == key => Some(fields.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl DestinationStore for MemoryDestination {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), DestinationError> {
        self.record(Write::HashSet {
            key: key.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<(), DestinationError> {
        self.record(Write::ListPush {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), DestinationError> {
        self.record(Write::SetAdd {
            key: key.to_string(),
            member: member.to_string(),
        })
    }

    async fn sorted_set_add(
        &self,
        key: &str,
        score: f64,
        member: &str,
    ) -> Result<(), DestinationError> {
        self.record(Write::SortedSetAdd {
            key: key.to_string(),
            score,
            member: member.to_string(),
        })
    }

    async fn stream_append(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<(), DestinationError> {
        self.record(Write::StreamAppend {
            key: key.to_string(),
            fields: fields.to_vec(),
        })
    }
}

/// Row source that replays queued batches, one per query. Once the queue is
/// drained every query returns no rows.
#[derive(Debug, Default)]
pub struct StaticRowSource {
    batches: Mutex<VecDeque<Result<Vec<Row>, String>>>,
    queries: Mutex<Vec<(String, Vec<Value>)>>,
    abandoned: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(self, rows: Vec<Row>) -> Self {
        self.push_batch(rows);
        self
    }

    /// Every query sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_batch(&self, rows: Vec<Row>) {
        lock(&self.batches).push_back(Ok(rows));
    }

    pub fn push_failure(&self, message: &str) {
        lock(&self.batches).push_back(Err(message.to_string()));
    }

    /// Every query received so far, with its arguments.
    pub fn queries(&self) -> Vec<(String, Vec<Value>)> {
        lock(&self.queries).clone()
    }

    /// Queries whose future was dropped before they answered.
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }
}

struct InFlight<'a> {
    abandoned: &'a AtomicUsize,
    done: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl RowSource for StaticRowSource {
    async fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, SourceError> {
        lock(&self.queries).push((sql.to_string(), args.to_vec()));
        let mut in_flight = InFlight {
            abandoned: &self.abandoned,
            done: false,
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        in_flight.done = true;
        let next = lock(&self.batches).pop_front();
        match next {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(SourceError::Other(message)),
            None => Ok(Vec::new()),
        }
    }
}
