//! Converts planner arguments into parameters of the exact SQL type the
//! server inferred for each placeholder.
//!
//! Checkpoints travel as text, but the binary protocol refuses to bind a Rust
//! `String` to, say, a `timestamptz` placeholder. The prepared statement tells
//! us the expected type, so the text is parsed into the matching Rust type.

use crate::sql::{error::DbError, postgres::params::PgParam};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::core::value::Value;
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio_postgres::types::Type;
use uuid::Uuid;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub(crate) fn coerce_param(index: usize, value: &Value, ty: &Type) -> Result<PgParam, DbError> {
    let mismatch = || DbError::Coercion {
        index: index + 1,
        value: value.to_string(),
        sql_type: ty.name().to_string(),
    };
    let text = value.encode().ok_or_else(mismatch)?;
    let text = text.as_str();

    let param = match *ty {
        Type::INT2 => PgParam::new(text.parse::<i16>().map_err(|_| mismatch())?),
        Type::INT4 => PgParam::new(text.parse::<i32>().map_err(|_| mismatch())?),
        Type::INT8 => PgParam::new(text.parse::<i64>().map_err(|_| mismatch())?),
        Type::FLOAT4 => PgParam::new(text.parse::<f32>().map_err(|_| mismatch())?),
        Type::FLOAT8 => PgParam::new(text.parse::<f64>().map_err(|_| mismatch())?),
        Type::NUMERIC => PgParam::new(
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .map_err(|_| mismatch())?,
        ),
        Type::TIMESTAMPTZ => PgParam::new(parse_timestamptz(text).ok_or_else(mismatch)?),
        Type::TIMESTAMP => PgParam::new(parse_timestamp(text).ok_or_else(mismatch)?),
        Type::DATE => PgParam::new(parse_date(text).ok_or_else(mismatch)?),
        Type::UUID => PgParam::new(Uuid::parse_str(text).map_err(|_| mismatch())?),
        _ => PgParam::new(text.to_string()),
    };
    Ok(param)
}

fn parse_timestamptz(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_naive(s).map(|naive| naive.and_utc()))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    parse_naive(s).or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.naive_utc())
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
