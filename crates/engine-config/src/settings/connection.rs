use connectors::redis::RedisOptions;
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    /// `disable`, `prefer` or `require`.
    pub sslmode: String,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        PostgresSettings {
            host: "localhost".to_string(),
            port: 5432,
            user: String::new(),
            password: String::new(),
            dbname: String::new(),
            sslmode: "disable".to_string(),
        }
    }
}

impl PostgresSettings {
    pub const SSL_MODES: &'static [&'static str] = &["disable", "prefer", "require"];

    /// libpq-style `key='value'` connection string. Empty settings are left
    /// out so the driver defaults apply.
    pub fn conninfo(&self) -> String {
        let port = self.port.to_string();
        [
            ("host", self.host.as_str()),
            ("port", port.as_str()),
            ("user", self.user.as_str()),
            ("password", self.password.as_str()),
            ("dbname", self.dbname.as_str()),
            ("sslmode", self.sslmode.as_str()),
        ]
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}='{}'", quote(value)))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Same fields as the connection string, with the password masked.
impl fmt::Display for PostgresSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgres://{}@{}:{}/{} (sslmode={})",
            self.user, self.host, self.port, self.dbname, self.sslmode
        )
    }
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub db: i64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        RedisSettings {
            addr: "127.0.0.1:6379".to_string(),
            password: None,
            db: 0,
        }
    }
}

impl RedisSettings {
    pub fn options(&self) -> RedisOptions {
        RedisOptions {
            addr: self.addr.clone(),
            password: self.password.clone().filter(|p| !p.is_empty()),
            db: self.db,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointBackend {
    /// Plain string keys on the destination server.
    #[default]
    Redis,
    /// Local embedded database at `checkpoints.path`.
    Sled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointSettings {
    pub backend: CheckpointBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}
