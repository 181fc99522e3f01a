use crate::{
    connectors::destination::DestinationStore,
    error::DestinationError,
    load::{Written, required},
};
use model::records::row::Row;

/// `HSET key <key column> <value column>`
#[derive(Debug, Clone, PartialEq)]
pub struct MapLoader {
    pub key: String,
    pub value: String,
}

impl MapLoader {
    pub(crate) async fn write(
        &self,
        row: &Row,
        key: &str,
        destination: &dyn DestinationStore,
    ) -> Result<Written, DestinationError> {
        let (field, value) = match (required(row, &self.key), required(row, &self.value)) {
            (Ok(field), Ok(value)) => (field, value),
            (Err(reason), _) | (_, Err(reason)) => return Ok(Written::Skipped(reason)),
        };
        destination.hash_set(key, &field, &value).await?;
        Ok(Written::Loaded)
    }
}
