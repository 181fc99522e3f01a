use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::value::Value,
    records::row::{FieldValue, Row},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tokio_postgres::{Row as PgRow, types::Type};
use tracing::warn;
use uuid::Uuid;

/// Decodes a driver row into the engine's scalar row, column by column.
pub(crate) fn to_row(row: &PgRow) -> Row {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| FieldValue {
            name: column.name().to_string(),
            value: decode(row, idx, column.type_()),
        })
        .collect();
    Row::new(fields)
}

fn decode(row: &PgRow, idx: usize, ty: &Type) -> Value {
    let decoded = match *ty {
        Type::INT2 => get::<i16>(row, idx).map(|v| v.map(|v| Value::Int(v as i64))),
        Type::INT4 => get::<i32>(row, idx).map(|v| v.map(|v| Value::Int(v as i64))),
        Type::INT8 => get::<i64>(row, idx).map(|v| v.map(Value::Int)),
        Type::OID => get::<u32>(row, idx).map(|v| v.map(|v| Value::Int(v as i64))),
        Type::FLOAT4 => get::<f32>(row, idx).map(|v| v.map(|v| Value::Float(v as f64))),
        Type::FLOAT8 => get::<f64>(row, idx).map(|v| v.map(Value::Float)),
        Type::NUMERIC => get::<Decimal>(row, idx).map(|v| v.and_then(decimal_value)),
        Type::BOOL => get::<bool>(row, idx).map(|v| v.map(|b| Value::Text(b.to_string()))),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx).map(|v| v.map(Value::Timestamp)),
        Type::TIMESTAMP => {
            get::<NaiveDateTime>(row, idx).map(|v| v.map(|ts| Value::Timestamp(ts.and_utc())))
        }
        Type::DATE => get::<NaiveDate>(row, idx).map(|v| {
            v.and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ts| Value::Timestamp(ts.and_utc()))
        }),
        Type::UUID => get::<Uuid>(row, idx).map(|v| v.map(|u| Value::Text(u.to_string()))),
        Type::JSON | Type::JSONB => {
            get::<serde_json::Value>(row, idx).map(|v| v.map(|j| Value::Text(j.to_string())))
        }
        _ => get::<String>(row, idx).map(|v| v.map(Value::Text)),
    };

    match decoded {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(err) => {
            warn!(
                column = row.columns()[idx].name(),
                sql_type = ty.name(),
                %err,
                "Unsupported column type, reading as NULL"
            );
            Value::Null
        }
    }
}

fn get<'a, T>(row: &'a PgRow, idx: usize) -> Result<Option<T>, tokio_postgres::Error>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
}

/// Integral decimals stay integers so `NUMERIC` ids keep exact ordering.
fn decimal_value(d: Decimal) -> Option<Value> {
    if d.fract().is_zero()
        && let Some(i) = d.to_i64()
    {
        return Some(Value::Int(i));
    }
    d.to_f64().map(Value::Float)
}
