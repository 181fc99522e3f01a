use crate::{
    connectors::destination::DestinationStore,
    error::DestinationError,
    load::{Written, required},
};
use model::records::row::Row;

/// One stream entry per row.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamLoader {
    /// (entry field, source column) in declaration order. Entry fields use
    /// the logical names.
    pub fields: Vec<(String, String)>,
}

impl StreamLoader {
    pub(crate) async fn write(
        &self,
        row: &Row,
        key: &str,
        destination: &dyn DestinationStore,
    ) -> Result<Written, DestinationError> {
        let mut entry = Vec::with_capacity(self.fields.len());
        for (field, column) in &self.fields {
            match required(row, column) {
                Ok(value) => entry.push((field.clone(), value)),
                Err(reason) => return Ok(Written::Skipped(reason)),
            }
        }
        destination.stream_append(key, &entry).await?;
        Ok(Written::Loaded)
    }
}
