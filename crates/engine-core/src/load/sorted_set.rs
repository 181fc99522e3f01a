use crate::{
    connectors::destination::DestinationStore,
    error::DestinationError,
    load::{SkipReason, Written, required},
};
use model::records::row::Row;

/// `ZADD key <score> <member>`. Scores may arrive as integers, floats or
/// numeric text.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetLoader {
    pub value: String,
    pub score: String,
}

impl SortedSetLoader {
    pub(crate) async fn write(
        &self,
        row: &Row,
        key: &str,
        destination: &dyn DestinationStore,
    ) -> Result<Written, DestinationError> {
        let member = match required(row, &self.value) {
            Ok(member) => member,
            Err(reason) => return Ok(Written::Skipped(reason)),
        };
        let Some(raw) = row.get_present(&self.score) else {
            return Ok(Written::Skipped(SkipReason::Missing(self.score.clone())));
        };
        let Some(score) = raw.as_f64() else {
            return Ok(Written::Skipped(SkipReason::BadScore(raw.to_string())));
        };
        destination.sorted_set_add(key, score, &member).await?;
        Ok(Written::Loaded)
    }
}
