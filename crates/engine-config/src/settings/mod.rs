//! Shape of the YAML configuration file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod connection;
pub mod validator;

pub use connection::{CheckpointBackend, CheckpointSettings, PostgresSettings, RedisSettings};
pub use validator::ConfigValidator;

pub const DEFAULT_STRUCTURE: &str = "stream";
pub const DEFAULT_SCHEDULE: &str = "@every 5m";
pub const DEFAULT_OPERATOR: &str = ">";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application default for logging generated SQL; tasks may override.
    pub log_sql: bool,
    pub postgres: PostgresSettings,
    pub redis: RedisSettings,
    pub checkpoints: CheckpointSettings,
    pub tasks: Vec<TaskSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    pub name: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub column_map: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_sql: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub last_value_key: String,
}

impl AppConfig {
    /// Fills in what the file may omit: a bare table lands in `public`,
    /// structure falls back to stream, schedule to every five minutes.
    pub fn apply_defaults(&mut self) {
        for task in &mut self.tasks {
            task.apply_defaults();
        }
    }
}

impl TaskSettings {
    pub fn apply_defaults(&mut self) {
        if !self.table.is_empty() && !self.table.contains('.') {
            self.table = format!("public.{}", self.table);
        }
        if self.structure.as_deref().is_none_or(str::is_empty) {
            self.structure = Some(DEFAULT_STRUCTURE.to_string());
        }
        if self.schedule.as_deref().is_none_or(|s| s.trim().is_empty()) {
            self.schedule = Some(DEFAULT_SCHEDULE.to_string());
        }
        if let Some(tracking) = &mut self.tracking
            && tracking.operator.as_deref().is_none_or(str::is_empty)
        {
            tracking.operator = Some(DEFAULT_OPERATOR.to_string());
        }
    }

    /// Destination key: optional prefix, then the alias or the table text.
    pub fn destination_key(&self) -> String {
        let base = self
            .alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .unwrap_or(&self.table);
        format!("{}{}", self.key_prefix.as_deref().unwrap_or_default(), base)
    }

    pub fn effective_log_sql(&self, app_default: bool) -> bool {
        self.log_sql.unwrap_or(app_default)
    }

    pub fn resolve_column<'a>(&'a self, logical: &'a str) -> &'a str {
        self.column_map
            .get(logical)
            .map(String::as_str)
            .unwrap_or(logical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_table_structure_and_schedule() {
        let mut task = TaskSettings {
            name: "orders".into(),
            table: "orders".into(),
            tracking: Some(TrackingSettings {
                column: "id".into(),
                operator: None,
                last_value_key: "orders:last".into(),
            }),
            ..Default::default()
        };
        task.apply_defaults();

        assert_eq!(task.table, "public.orders");
        assert_eq!(task.structure.as_deref(), Some("stream"));
        assert_eq!(task.schedule.as_deref(), Some("@every 5m"));
        assert_eq!(
            task.tracking.and_then(|t| t.operator).as_deref(),
            Some(">")
        );
    }

    #[test]
    fn qualified_table_is_left_alone() {
        let mut task = TaskSettings {
            table: "sales.orders".into(),
            schedule: Some("@hourly".into()),
            ..Default::default()
        };
        task.apply_defaults();
        assert_eq!(task.table, "sales.orders");
        assert_eq!(task.schedule.as_deref(), Some("@hourly"));
    }

    #[test]
    fn destination_key_prefers_alias_and_applies_prefix() {
        let mut task = TaskSettings {
            table: "public.orders".into(),
            ..Default::default()
        };
        assert_eq!(task.destination_key(), "public.orders");

        task.alias = Some("orders".into());
        task.key_prefix = Some("app:".into());
        assert_eq!(task.destination_key(), "app:orders");
    }

    #[test]
    fn task_log_sql_overrides_app_default() {
        let mut task = TaskSettings::default();
        assert!(task.effective_log_sql(true));
        task.log_sql = Some(false);
        assert!(!task.effective_log_sql(true));
    }
}
