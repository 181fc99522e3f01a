use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Every problem found in the file, one message per entry.
    #[error("Invalid configuration:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

/// A schedule expression that is neither `@every <duration>`, a descriptor
/// such as `@hourly`, nor a 5 or 6 field cron line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("empty schedule")]
    Empty,

    #[error("invalid @every duration {0:?}: {1}")]
    Interval(String, String),

    #[error("@every interval must be positive")]
    ZeroInterval,

    #[error("unknown descriptor {0:?}")]
    Descriptor(String),

    #[error("cron expression must have 5 or 6 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid cron expression {0:?}: {1}")]
    Cron(String, String),
}
