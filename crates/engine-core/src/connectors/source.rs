use crate::error::SourceError;
use async_trait::async_trait;
use connectors::sql::postgres::adapter::PgAdapter;
use model::{core::value::Value, records::row::Row};

/// Relational side of a task: runs a parameterized query and returns every
/// row of the result.
///
/// Dropping a `query` future before it resolves must stop the work on the
/// server; the runner does this when a run exceeds its timeout.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, SourceError>;
}

#[async_trait]
impl RowSource for PgAdapter {
    async fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, SourceError> {
        Ok(self.query_rows(sql, args).await?)
    }
}
