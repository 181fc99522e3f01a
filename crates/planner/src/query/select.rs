//! Builds the incremental `SELECT` issued for one task execution.

use crate::{
    error::PlanError,
    query::dialect::{Dialect, Postgres},
};
use model::{
    core::{identifiers::TableRef, value::Value},
    task::spec::TrackingSpec,
};
use serde::Serialize;

/// Input for building a SELECT query.
#[derive(Debug, Clone, Copy)]
pub struct SelectSpec<'a> {
    pub table: &'a TableRef,
    /// Physical columns in declaration order.
    pub columns: &'a [String],
    /// Raw predicate without the `WHERE` keyword.
    pub filter: Option<&'a str>,
    pub tracking: Option<&'a TrackingSpec>,
    /// Stored checkpoint; `None` or empty means first run.
    pub last_checkpoint: Option<&'a str>,
}

/// Output plan for DB execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectPlan {
    pub sql: String,
    pub args: Vec<Value>,
    /// True when tracking is configured but no checkpoint exists yet, so the
    /// tracking predicate was left out.
    pub first_run: bool,
    pub tracking_column: Option<String>,
}

/// Builds a PostgreSQL plan. See [`build_select_with`].
pub fn build_select(spec: &SelectSpec<'_>) -> Result<SelectPlan, PlanError> {
    build_select_with(&Postgres, spec)
}

/// Builds a plan with an optional static filter and an optional tracking
/// predicate. The checkpoint is only ever bound as a positional parameter.
pub fn build_select_with(
    dialect: &dyn Dialect,
    spec: &SelectSpec<'_>,
) -> Result<SelectPlan, PlanError> {
    if spec.columns.is_empty() {
        return Err(PlanError::NoColumns);
    }
    if spec.table.table.is_empty() {
        return Err(PlanError::NoTable);
    }
    if spec.table.table.contains('.') || spec.table.schema.contains('.') {
        return Err(PlanError::AmbiguousTable(spec.table.to_string()));
    }

    let schema = if spec.table.schema.is_empty() {
        TableRef::DEFAULT_SCHEMA
    } else {
        &spec.table.schema
    };

    let mut columns: Vec<&str> = Vec::with_capacity(spec.columns.len() + 1);
    for col in spec.columns {
        if !columns.contains(&col.as_str()) {
            columns.push(col);
        }
    }

    let tracking_column = match spec.tracking {
        Some(t) if t.column.is_empty() => return Err(PlanError::EmptyTrackingColumn),
        Some(t) => {
            if !columns.contains(&t.column.as_str()) {
                columns.push(&t.column);
            }
            Some(t.column.clone())
        }
        None => None,
    };

    let mut sql = format!(
        "SELECT {} FROM {}.{}",
        columns.join(", "),
        dialect.quote_identifier(schema),
        dialect.quote_identifier(&spec.table.table),
    );

    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();
    let mut first_run = false;

    if let Some(filter) = spec.filter.map(str::trim).filter(|f| !f.is_empty()) {
        clauses.push(filter.to_string());
    }

    if let Some(tracking) = spec.tracking {
        match spec.last_checkpoint.filter(|cp| !cp.is_empty()) {
            Some(checkpoint) => {
                clauses.push(format!(
                    "{} {} {}",
                    tracking.column,
                    tracking.operator.as_sql(),
                    dialect.get_placeholder(args.len()),
                ));
                args.push(Value::Text(checkpoint.to_string()));
            }
            None => first_run = true,
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    Ok(SelectPlan {
        sql,
        args,
        first_run,
        tracking_column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::task::spec::Operator;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn created_at() -> TrackingSpec {
        TrackingSpec {
            column: "created_at".into(),
            operator: Operator::Gt,
            checkpoint_key: "orders:last".into(),
        }
    }

    #[test]
    fn no_filter_no_tracking() {
        let table = TableRef::parse("orders");
        let columns = cols(&["id", "status"]);
        let plan = build_select(&SelectSpec {
            table: &table,
            columns: &columns,
            filter: None,
            tracking: None,
            last_checkpoint: None,
        })
        .unwrap();

        assert_eq!(plan.sql, r#"SELECT id, status FROM "public"."orders""#);
        assert!(plan.args.is_empty());
        assert!(!plan.first_run);
        assert_eq!(plan.tracking_column, None);
    }

    #[test]
    fn filter_only() {
        let table = TableRef::new("public", "orders");
        let columns = cols(&["id"]);
        let plan = build_select(&SelectSpec {
            table: &table,
            columns: &columns,
            filter: Some("status = 'NEW'"),
            tracking: None,
            last_checkpoint: None,
        })
        .unwrap();

        assert_eq!(
            plan.sql,
            r#"SELECT id FROM "public"."orders" WHERE status = 'NEW'"#
        );
    }

    #[test]
    fn tracking_without_checkpoint_is_first_run() {
        let table = TableRef::parse("orders");
        let columns = cols(&["id", "amount"]);
        let tracking = created_at();
        let plan = build_select(&SelectSpec {
            table: &table,
            columns: &columns,
            filter: Some("amount > 1000"),
            tracking: Some(&tracking),
            last_checkpoint: None,
        })
        .unwrap();

        assert_eq!(
            plan.sql,
            r#"SELECT id, amount, created_at FROM "public"."orders" WHERE amount > 1000"#
        );
        assert!(plan.first_run);
        assert!(plan.args.is_empty());
        assert_eq!(plan.tracking_column.as_deref(), Some("created_at"));
    }

    #[test]
    fn empty_checkpoint_counts_as_absent() {
        let table = TableRef::parse("orders");
        let columns = cols(&["id", "created_at"]);
        let tracking = created_at();
        let plan = build_select(&SelectSpec {
            table: &table,
            columns: &columns,
            filter: None,
            tracking: Some(&tracking),
            last_checkpoint: Some(""),
        })
        .unwrap();

        assert_eq!(plan.sql, r#"SELECT id, created_at FROM "public"."orders""#);
        assert!(plan.first_run);
    }

    #[test]
    fn filter_and_tracking_with_checkpoint_binds_parameter() {
        let table = TableRef::parse("public.orders");
        let columns = cols(&["id", "amount", "created_at"]);
        let tracking = created_at();
        let plan = build_select(&SelectSpec {
            table: &table,
            columns: &columns,
            filter: Some("amount > 1000"),
            tracking: Some(&tracking),
            last_checkpoint: Some("2025-09-18T00:00:00Z"),
        })
        .unwrap();

        assert_eq!(
            plan.sql,
            r#"SELECT id, amount, created_at FROM "public"."orders" WHERE amount > 1000 AND created_at > $1"#
        );
        assert!(plan.sql.ends_with("WHERE amount > 1000 AND created_at > $1"));
        assert_eq!(plan.args, vec![Value::Text("2025-09-18T00:00:00Z".into())]);
        assert!(!plan.first_run);
    }

    #[test]
    fn checkpoint_is_never_inlined() {
        let table = TableRef::parse("orders");
        let columns = cols(&["id"]);
        let tracking = TrackingSpec {
            operator: Operator::Gte,
            ..created_at()
        };
        let hostile = "x'; DROP TABLE orders; --";
        let plan = build_select(&SelectSpec {
            table: &table,
            columns: &columns,
            filter: None,
            tracking: Some(&tracking),
            last_checkpoint: Some(hostile),
        })
        .unwrap();

        assert!(!plan.sql.contains(hostile));
        assert!(plan.sql.ends_with("WHERE created_at >= $1"));
        assert_eq!(plan.args, vec![Value::Text(hostile.into())]);
    }

    #[test]
    fn identical_inputs_give_identical_plans() {
        let table = TableRef::parse("sales.orders");
        let columns = cols(&["id", "status", "id"]);
        let tracking = created_at();
        let spec = SelectSpec {
            table: &table,
            columns: &columns,
            filter: Some("amount > 1000"),
            tracking: Some(&tracking),
            last_checkpoint: Some("42"),
        };

        let first = build_select(&spec).unwrap();
        let second = build_select(&spec).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sql.as_bytes(), second.sql.as_bytes());
        assert!(first.sql.starts_with(r#"SELECT id, status, created_at FROM "sales"."orders""#));
    }

    #[test]
    fn rejects_empty_columns_and_ambiguous_tables() {
        let table = TableRef::parse("orders");
        let err = build_select(&SelectSpec {
            table: &table,
            columns: &[],
            filter: None,
            tracking: None,
            last_checkpoint: None,
        })
        .unwrap_err();
        assert_eq!(err, PlanError::NoColumns);

        let ambiguous = TableRef::parse("db.sales.orders");
        let columns = cols(&["id"]);
        let err = build_select(&SelectSpec {
            table: &ambiguous,
            columns: &columns,
            filter: None,
            tracking: None,
            last_checkpoint: None,
        })
        .unwrap_err();
        assert!(matches!(err, PlanError::AmbiguousTable(_)));

        let unnamed = TableRef::new("public", "");
        let err = build_select(&SelectSpec {
            table: &unnamed,
            columns: &columns,
            filter: None,
            tracking: None,
            last_checkpoint: None,
        })
        .unwrap_err();
        assert_eq!(err, PlanError::NoTable);
    }

    #[test]
    fn empty_schema_falls_back_to_public() {
        let table = TableRef::new("", "orders");
        let columns = cols(&["id"]);
        let plan = build_select(&SelectSpec {
            table: &table,
            columns: &columns,
            filter: Some("   "),
            tracking: None,
            last_checkpoint: None,
        })
        .unwrap();
        assert_eq!(plan.sql, r#"SELECT id FROM "public"."orders""#);
    }
}
