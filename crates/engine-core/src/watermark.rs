//! High-water-mark computation over a fetched batch.

use crate::{error::WatermarkError, state::CheckpointStore};
use model::{core::value::Value, records::row::Row, task::spec::TrackingSpec};
use std::cmp::Ordering;
use tracing::debug;

/// Largest non-null value of `column` in `rows`, never below `previous`.
///
/// `previous` is the stored checkpoint string; it is decoded with the
/// variant of the batch maximum before comparing. Returns `None` when no row
/// carries a tracking value.
pub fn next_checkpoint(
    rows: &[Row],
    column: &str,
    previous: Option<&str>,
) -> Result<Option<Value>, WatermarkError> {
    let mut max: Option<&Value> = None;
    for value in rows.iter().filter_map(|row| row.get_present(column)) {
        max = match max {
            None => Some(value),
            Some(current) => match compare(column, value, current)? {
                Ordering::Greater => Some(value),
                _ => Some(current),
            },
        };
    }

    let Some(max) = max else {
        return Ok(None);
    };
    let Some(previous) = previous.filter(|p| !p.is_empty()) else {
        return Ok(Some(max.clone()));
    };

    let decoded = max
        .decode_like(previous)
        .ok_or_else(|| WatermarkError::UndecodableCheckpoint {
            value: previous.to_string(),
            expected: max.type_name(),
        })?;
    match compare(column, max, &decoded)? {
        Ordering::Less => Ok(Some(decoded)),
        _ => Ok(Some(max.clone())),
    }
}

fn compare(column: &str, left: &Value, right: &Value) -> Result<Ordering, WatermarkError> {
    left.compare(right)
        .ok_or_else(|| WatermarkError::IncomparableTypes {
            column: column.to_string(),
            left: left.type_name(),
            right: right.type_name(),
        })
}

/// Computes and stores the next checkpoint for a successfully loaded batch.
///
/// An empty batch, or one without any tracking value, leaves the stored
/// checkpoint alone. Returns the encoded checkpoint that was written.
pub async fn advance(
    store: &dyn CheckpointStore,
    tracking: &TrackingSpec,
    rows: &[Row],
    previous: Option<&str>,
) -> Result<Option<String>, WatermarkError> {
    if rows.is_empty() {
        return Ok(None);
    }
    let Some(next) = next_checkpoint(rows, &tracking.column, previous)? else {
        debug!(column = %tracking.column, "Batch has no tracking values");
        return Ok(None);
    };
    let Some(encoded) = next.encode() else {
        return Ok(None);
    };
    if previous == Some(encoded.as_str()) {
        return Ok(Some(encoded));
    }
    store.set(&tracking.checkpoint_key, &encoded).await?;
    Ok(Some(encoded))
}
