//! Conversion of fetched rows into destination writes, one strategy per
//! structure kind.
//!
//! Every strategy follows the same row policy: a row missing a required
//! field (absent or NULL), or carrying a score that is not numeric, is
//! skipped and counted. Skips never abort the batch. The first destination
//! error does, and the rows written before it stay written.

use crate::{connectors::destination::DestinationStore, error::LoadError};
use model::{
    records::row::Row,
    task::spec::{Structure, StructureKind, TaskSpec},
};
use tracing::debug;

pub mod list;
pub mod map;
pub mod set;
pub mod sorted_set;
pub mod stream;

pub use list::ListLoader;
pub use map::MapLoader;
pub use set::SetLoader;
pub use sorted_set::SortedSetLoader;
pub use stream::StreamLoader;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStrategy {
    Map(MapLoader),
    List(ListLoader),
    Set(SetLoader),
    SortedSet(SortedSetLoader),
    Stream(StreamLoader),
}

impl LoadStrategy {
    /// Resolves the task's role fields to physical columns once, up front.
    pub fn for_task(task: &TaskSpec) -> Self {
        let col = |logical: &str| task.resolve_column(logical).to_string();
        match &task.structure {
            Structure::Map { key, value } => LoadStrategy::Map(MapLoader {
                key: col(key),
                value: col(value),
            }),
            Structure::List { value } => LoadStrategy::List(ListLoader { value: col(value) }),
            Structure::Set { value } => LoadStrategy::Set(SetLoader { value: col(value) }),
            Structure::SortedSet { value, score } => LoadStrategy::SortedSet(SortedSetLoader {
                value: col(value),
                score: col(score),
            }),
            Structure::Stream { fields } => LoadStrategy::Stream(StreamLoader {
                fields: fields
                    .iter()
                    .map(|logical| (logical.clone(), col(logical)))
                    .collect(),
            }),
        }
    }

    pub fn kind(&self) -> StructureKind {
        match self {
            LoadStrategy::Map(_) => StructureKind::Map,
            LoadStrategy::List(_) => StructureKind::List,
            LoadStrategy::Set(_) => StructureKind::Set,
            LoadStrategy::SortedSet(_) => StructureKind::SortedSet,
            LoadStrategy::Stream(_) => StructureKind::Stream,
        }
    }

    pub async fn apply(
        &self,
        rows: &[Row],
        key: &str,
        destination: &dyn DestinationStore,
    ) -> Result<LoadStats, LoadError> {
        let mut stats = LoadStats::default();
        for (idx, row) in rows.iter().enumerate() {
            let written = match self {
                LoadStrategy::Map(loader) => loader.write(row, key, destination).await,
                LoadStrategy::List(loader) => loader.write(row, key, destination).await,
                LoadStrategy::Set(loader) => loader.write(row, key, destination).await,
                LoadStrategy::SortedSet(loader) => loader.write(row, key, destination).await,
                LoadStrategy::Stream(loader) => loader.write(row, key, destination).await,
            };
            match written {
                Ok(Written::Loaded) => stats.loaded += 1,
                Ok(Written::Skipped(reason)) => {
                    debug!(row = idx, key, kind = %self.kind(), %reason, "Skipping row");
                    stats.skipped += 1;
                }
                Err(source) => {
                    return Err(LoadError {
                        key: key.to_string(),
                        loaded: stats.loaded,
                        source,
                    });
                }
            }
        }
        Ok(stats)
    }
}

/// What happened to a single row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Written {
    Loaded,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SkipReason {
    Missing(String),
    BadScore(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Missing(column) => write!(f, "missing value for column {column:?}"),
            SkipReason::BadScore(raw) => write!(f, "score {raw:?} is not numeric"),
        }
    }
}

/// Encoded value of a required column.
pub(crate) fn required(row: &Row, column: &str) -> Result<String, SkipReason> {
    row.get_present(column)
        .and_then(|value| value.encode())
        .ok_or_else(|| SkipReason::Missing(column.to_string()))
}
