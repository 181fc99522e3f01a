use thiserror::Error;

/// Reasons a task cannot be turned into a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no columns provided")]
    NoColumns,

    #[error("no table provided")]
    NoTable,

    /// More than one schema qualifier, e.g. `db.schema.table`.
    #[error("ambiguous table reference: {0}")]
    AmbiguousTable(String),

    #[error("tracking column is empty")]
    EmptyTrackingColumn,
}
