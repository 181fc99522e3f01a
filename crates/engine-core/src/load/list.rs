use crate::{
    connectors::destination::DestinationStore,
    error::DestinationError,
    load::{Written, required},
};
use model::records::row::Row;

/// Appends the value column, so the first fetched row ends up nearest the
/// head of the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListLoader {
    pub value: String,
}

impl ListLoader {
    pub(crate) async fn write(
        &self,
        row: &Row,
        key: &str,
        destination: &dyn DestinationStore,
    ) -> Result<Written, DestinationError> {
        let value = match required(row, &self.value) {
            Ok(value) => value,
            Err(reason) => return Ok(Written::Skipped(reason)),
        };
        destination.list_push(key, &value).await?;
        Ok(Written::Loaded)
    }
}
