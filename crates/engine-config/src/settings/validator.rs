use crate::{
    error::ConfigError,
    schedule::ScheduleParser,
    settings::{AppConfig, CheckpointBackend, PostgresSettings, TaskSettings, TrackingSettings},
};
use model::{
    core::identifiers::TableRef,
    task::spec::{Operator, Structure, StructureKind, TaskSpec, TrackingSpec},
};
use std::{collections::HashSet, str::FromStr, time::Duration};
use tracing::{debug, info};

/// Checks a loaded configuration and turns its task entries into
/// [`TaskSpec`]s. Every problem is collected before failing, so one run of
/// `validate` reports the whole file.
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator {
    schedules: ScheduleParser,
}

impl ConfigValidator {
    pub fn new(schedules: ScheduleParser) -> Self {
        Self { schedules }
    }

    pub fn validate(&self, config: &AppConfig) -> Result<Vec<TaskSpec>, ConfigError> {
        info!(tasks = config.tasks.len(), "Validating configuration");

        let mut errors: Vec<String> = Vec::new();
        self.validate_connections(config, &mut errors);

        if config.tasks.is_empty() {
            errors.push("no tasks configured".to_string());
        }

        let mut names = HashSet::new();
        let mut checkpoint_keys = HashSet::new();
        let mut specs = Vec::with_capacity(config.tasks.len());

        for task in &config.tasks {
            if !task.name.is_empty() && !names.insert(task.name.as_str()) {
                errors.push(format!("duplicate task name {:?}", task.name));
            }
            if let Some(tracking) = &task.tracking
                && !tracking.last_value_key.is_empty()
                && !checkpoint_keys.insert(tracking.last_value_key.as_str())
            {
                errors.push(format!(
                    "task {:?}: checkpoint key {:?} is already used by another task",
                    task.name, tracking.last_value_key
                ));
            }

            let mut task_errors = Vec::new();
            let spec = self.validate_task(task, config.log_sql, &mut task_errors);
            let label = if task.name.is_empty() {
                "<unnamed>"
            } else {
                task.name.as_str()
            };
            errors.extend(task_errors.into_iter().map(|e| format!("task {label:?}: {e}")));
            specs.extend(spec);
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        info!(tasks = specs.len(), "Configuration validated");
        Ok(specs)
    }

    fn validate_connections(&self, config: &AppConfig, errors: &mut Vec<String>) {
        if !PostgresSettings::SSL_MODES.contains(&config.postgres.sslmode.as_str()) {
            errors.push(format!(
                "postgres.sslmode {:?} is not one of {}",
                config.postgres.sslmode,
                PostgresSettings::SSL_MODES.join(", ")
            ));
        }
        if config.redis.addr.trim().is_empty() {
            errors.push("redis.addr is required".to_string());
        }
        if config.redis.db < 0 {
            errors.push(format!("redis.db {} must not be negative", config.redis.db));
        }
        if config.checkpoints.backend == CheckpointBackend::Sled
            && config.checkpoints.path.is_none()
        {
            errors.push("checkpoints.path is required for the sled backend".to_string());
        }
    }

    /// Returns the spec when the entry is valid; otherwise pushes its
    /// problems and returns `None`.
    fn validate_task(
        &self,
        task: &TaskSettings,
        app_log_sql: bool,
        errors: &mut Vec<String>,
    ) -> Option<TaskSpec> {
        if task.name.trim().is_empty() {
            errors.push("name is required".to_string());
        }

        let table = self.validate_table(&task.table, errors);
        let structure = self.validate_structure(task, errors);

        let schedule = task.schedule.clone().unwrap_or_default();
        if let Err(err) = self.schedules.parse(&schedule) {
            errors.push(format!("invalid schedule {schedule:?}: {err}"));
        }

        let timeout = match task.timeout_secs {
            Some(0) => {
                errors.push("timeout_secs must be positive".to_string());
                None
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(TaskSpec::DEFAULT_TIMEOUT),
        };

        let tracking = match (&task.tracking, &structure) {
            (Some(tracking), Some(structure)) => {
                self.validate_tracking(task, tracking, structure, errors)
            }
            _ => None,
        };

        if !errors.is_empty() {
            return None;
        }
        let structure = structure?;
        if task.tracking.is_some() && tracking.is_none() {
            return None;
        }

        let spec = TaskSpec {
            name: task.name.trim().into(),
            table: table?,
            structure,
            column_map: task.column_map.clone(),
            filter: task
                .filter
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            tracking,
            schedule: schedule.trim().to_string(),
            destination_key: task.destination_key(),
            log_sql: task.effective_log_sql(app_log_sql),
            timeout: timeout?,
        };
        debug!(task = %spec.name, key = %spec.destination_key, kind = %spec.kind(), "Task accepted");
        Some(spec)
    }

    fn validate_table(&self, table: &str, errors: &mut Vec<String>) -> Option<TableRef> {
        let table = table.trim();
        if table.is_empty() {
            errors.push("table is required".to_string());
            return None;
        }
        if table.matches('.').count() > 1 {
            errors.push(format!("invalid table {table:?}: at most one schema qualifier"));
            return None;
        }
        let table_ref = TableRef::parse(table);
        if table_ref.schema.is_empty() || table_ref.table.is_empty() {
            errors.push(format!("invalid table {table:?}"));
            return None;
        }
        Some(table_ref)
    }

    fn validate_structure(&self, task: &TaskSettings, errors: &mut Vec<String>) -> Option<Structure> {
        let raw = task.structure.as_deref().unwrap_or_default();
        let kind = match StructureKind::from_str(raw) {
            Ok(kind) => kind,
            Err(err) => {
                errors.push(err);
                return None;
            }
        };

        let mut role = |name: &str, value: &Option<String>| -> Option<String> {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => Some(v.to_string()),
                None => {
                    errors.push(format!("{kind} structure requires `{name}`"));
                    None
                }
            }
        };

        match kind {
            StructureKind::Map => {
                let key = role("key", &task.key);
                let value = role("value", &task.value);
                Some(Structure::Map {
                    key: key?,
                    value: value?,
                })
            }
            StructureKind::List => Some(Structure::List {
                value: role("value", &task.value)?,
            }),
            StructureKind::Set => Some(Structure::Set {
                value: role("value", &task.value)?,
            }),
            StructureKind::SortedSet => {
                let value = role("value", &task.value);
                let score = role("score", &task.score);
                Some(Structure::SortedSet {
                    value: value?,
                    score: score?,
                })
            }
            StructureKind::Stream => {
                let fields: Vec<String> = task
                    .fields
                    .iter()
                    .map(|f| f.trim().to_string())
                    .collect();
                if fields.is_empty() {
                    errors.push("stream structure requires at least one entry in `fields`".to_string());
                    return None;
                }
                if fields.iter().any(String::is_empty) {
                    errors.push("`fields` must not contain empty names".to_string());
                    return None;
                }
                Some(Structure::Stream { fields })
            }
        }
    }

    fn validate_tracking(
        &self,
        task: &TaskSettings,
        tracking: &TrackingSettings,
        structure: &Structure,
        errors: &mut Vec<String>,
    ) -> Option<TrackingSpec> {
        let before = errors.len();
        let column = tracking.column.trim();
        if column.is_empty() {
            errors.push("tracking.column is required".to_string());
        } else if !structure.declared_fields().contains(&column) {
            errors.push(format!(
                "tracking.column {column:?} is not one of the declared fields {:?}",
                structure.declared_fields()
            ));
        }

        let operator = tracking.operator.as_deref().unwrap_or(">");
        let operator = Operator::from_str(operator)
            .map_err(|err| errors.push(err))
            .ok();

        if tracking.last_value_key.trim().is_empty() {
            errors.push("tracking.last_value_key is required".to_string());
        }

        if errors.len() > before {
            return None;
        }
        Some(TrackingSpec {
            column: task.resolve_column(column).to_string(),
            operator: operator?,
            checkpoint_key: tracking.last_value_key.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_config;
    use std::collections::BTreeMap;

    fn validate(yaml: &str) -> Result<Vec<TaskSpec>, ConfigError> {
        ConfigValidator::default().validate(&parse_config(yaml).unwrap())
    }

    fn messages(err: ConfigError) -> Vec<String> {
        match err {
            ConfigError::Validation(messages) => messages,
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn builds_stream_task_with_defaults() {
        let specs = validate(
            r#"
tasks:
  - name: orders_stream
    table: orders
    fields: [id, status, created_at]
    column_map: { created_at: inserted_at }
    filter: "amount > 1000"
    tracking: { column: created_at, last_value_key: "orders:last" }
"#,
        )
        .unwrap();

        let spec = &specs[0];
        assert_eq!(spec.name.as_str(), "orders_stream");
        assert_eq!(spec.table, TableRef::new("public", "orders"));
        assert_eq!(spec.kind(), StructureKind::Stream);
        assert_eq!(spec.schedule, "@every 5m");
        assert_eq!(spec.destination_key, "public.orders");
        assert_eq!(spec.filter.as_deref(), Some("amount > 1000"));
        assert_eq!(spec.timeout, TaskSpec::DEFAULT_TIMEOUT);
        assert_eq!(
            spec.tracking,
            Some(TrackingSpec {
                column: "inserted_at".into(),
                operator: Operator::Gt,
                checkpoint_key: "orders:last".into(),
            })
        );
        assert_eq!(
            spec.column_map,
            BTreeMap::from([("created_at".to_string(), "inserted_at".to_string())])
        );
    }

    #[test]
    fn missing_role_fields_are_reported_per_kind() {
        let errors = messages(
            validate(
                r#"
tasks:
  - { name: a, table: t, structure: map, key: id }
  - { name: b, table: t, structure: sorted_set, value: id }
  - { name: c, table: t, structure: list }
  - { name: d, table: t, structure: stream }
"#,
            )
            .unwrap_err(),
        );
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors[0].contains("map structure requires `value`"));
        assert!(errors[1].contains("requires `score`"));
        assert!(errors[2].contains("list structure requires `value`"));
        assert!(errors[3].contains("at least one entry"));
    }

    #[test]
    fn tracking_column_must_be_declared() {
        let errors = messages(
            validate(
                r#"
tasks:
  - name: events
    table: events
    structure: list
    value: payload
    tracking: { column: created_at, operator: ">=", last_value_key: "events:last" }
"#,
            )
            .unwrap_err(),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not one of the declared fields"));
    }

    #[test]
    fn collects_every_problem() {
        let errors = messages(
            validate(
                r#"
postgres: { sslmode: verify-full }
checkpoints: { backend: sled }
tasks:
  - name: dup
    table: a.b.c
    fields: [id]
    schedule: "every now and then"
  - name: dup
    table: t
    fields: [id]
    timeout_secs: 0
    tracking: { column: id, operator: "<", last_value_key: "" }
"#,
            )
            .unwrap_err(),
        );
        let joined = errors.join("\n");
        assert!(joined.contains("sslmode"));
        assert!(joined.contains("checkpoints.path"));
        assert!(joined.contains("at most one schema qualifier"));
        assert!(joined.contains("invalid schedule"));
        assert!(joined.contains("duplicate task name"));
        assert!(joined.contains("timeout_secs"));
        assert!(joined.contains("unsupported tracking operator"));
        assert!(joined.contains("last_value_key is required"));
    }

    #[test]
    fn checkpoint_keys_are_exclusive() {
        let errors = messages(
            validate(
                r#"
tasks:
  - { name: a, table: t, fields: [id], tracking: { column: id, last_value_key: k } }
  - { name: b, table: u, fields: [id], tracking: { column: id, last_value_key: k } }
"#,
            )
            .unwrap_err(),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("already used"));
    }

    #[test]
    fn empty_task_list_is_rejected() {
        let errors = messages(validate("log_sql: true\n").unwrap_err());
        assert_eq!(errors, vec!["no tasks configured".to_string()]);
    }

    #[test]
    fn task_overrides_apply() {
        let specs = validate(
            r#"
log_sql: true
tasks:
  - name: board
    table: sales.scores
    structure: zset
    value: player
    score: points
    alias: leaderboard
    key_prefix: "app:"
    schedule: "*/5 * * * *"
    timeout_secs: 15
    log_sql: false
"#,
        )
        .unwrap();
        let spec = &specs[0];
        assert_eq!(spec.kind(), StructureKind::SortedSet);
        assert_eq!(spec.destination_key, "app:leaderboard");
        assert_eq!(spec.timeout, Duration::from_secs(15));
        assert!(!spec.log_sql);
        assert!(spec.tracking.is_none());
    }
}
