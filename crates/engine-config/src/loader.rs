use crate::{error::ConfigError, settings::AppConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable consulted when no `--config` flag is given.
pub const CONFIG_ENV: &str = "COURIER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Picks the config path: explicit flag, then `COURIER_CONFIG`, then
/// `config.yaml` in the working directory.
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::var_os(CONFIG_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Reads and parses the file, with defaults applied. Semantic checks are
/// left to [`crate::settings::ConfigValidator`].
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text)?;
    info!(path = %path.display(), tasks = config.tasks.len(), "Loaded configuration");
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    let mut config: AppConfig = serde_yaml::from_str(text)?;
    config.apply_defaults();
    Ok(config)
}
