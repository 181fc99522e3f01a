use crate::core::identifiers::{TableRef, TaskName};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

/// Shape of the data written to the destination store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Map,
    List,
    Set,
    SortedSet,
    Stream,
}

impl StructureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureKind::Map => "map",
            StructureKind::List => "list",
            StructureKind::Set => "set",
            StructureKind::SortedSet => "sorted_set",
            StructureKind::Stream => "stream",
        }
    }
}

impl FromStr for StructureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "map" | "hash" => Ok(StructureKind::Map),
            "list" => Ok(StructureKind::List),
            "set" => Ok(StructureKind::Set),
            "sorted_set" | "zset" => Ok(StructureKind::SortedSet),
            "stream" => Ok(StructureKind::Stream),
            other => Err(format!("unsupported structure: {other}")),
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role fields per structure kind. The variant carries exactly the logical
/// field names the kind needs, so a spec cannot exist without them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Structure {
    Map { key: String, value: String },
    List { value: String },
    Set { value: String },
    SortedSet { value: String, score: String },
    Stream { fields: Vec<String> },
}

impl Structure {
    pub fn kind(&self) -> StructureKind {
        match self {
            Structure::Map { .. } => StructureKind::Map,
            Structure::List { .. } => StructureKind::List,
            Structure::Set { .. } => StructureKind::Set,
            Structure::SortedSet { .. } => StructureKind::SortedSet,
            Structure::Stream { .. } => StructureKind::Stream,
        }
    }

    /// Logical fields in declaration order: the stream field list, or
    /// key, value, score for the other kinds.
    pub fn declared_fields(&self) -> Vec<&str> {
        match self {
            Structure::Map { key, value } => vec![key, value],
            Structure::List { value } | Structure::Set { value } => vec![value],
            Structure::SortedSet { value, score } => vec![value, score],
            Structure::Stream { fields } => fields.iter().map(String::as_str).collect(),
        }
    }
}

/// Comparison used by the tracking predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Gte => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            other => Err(format!("unsupported tracking operator: {other:?}")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSpec {
    /// Physical column name, already resolved through the column map.
    pub column: String,
    pub operator: Operator,
    /// Key under which the checkpoint is stored.
    pub checkpoint_key: String,
}

/// Immutable description of one replication task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: TaskName,
    pub table: TableRef,
    pub structure: Structure,
    /// Logical name → physical column.
    pub column_map: BTreeMap<String, String>,
    pub filter: Option<String>,
    pub tracking: Option<TrackingSpec>,
    pub schedule: String,
    pub destination_key: String,
    pub log_sql: bool,
    pub timeout: Duration,
}

impl TaskSpec {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn kind(&self) -> StructureKind {
        self.structure.kind()
    }

    pub fn resolve_column<'a>(&'a self, logical: &'a str) -> &'a str {
        self.column_map
            .get(logical)
            .map(String::as_str)
            .unwrap_or(logical)
    }

    /// Physical columns to select, deduplicated in declaration order.
    pub fn columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for logical in self.structure.declared_fields() {
            let physical = self.resolve_column(logical);
            if !out.iter().any(|c| c == physical) {
                out.push(physical.to_string());
            }
        }
        out
    }
}
