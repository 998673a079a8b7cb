// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::filter::FilterCommand;
use crate::config::model::{BuildLoggerConfig, RawConfigFile};
use crate::errors::Result;

/// Environment variable holding the filter command string.
pub const FILTER_CMD_ENV: &str = "BUILDLOG_FILTER_CMD";

/// Environment variable holding the destination log path.
pub const LOG_PATH_ENV: &str = "BUILDLOG_LOG_PATH";

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to get
/// a usable [`BuildLoggerConfig`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and validate it.
///
/// - Reads TOML.
/// - Rejects an empty `log_path` and malformed `[logger.env]` names.
/// - Tokenizes `filter_cmd`; unbalanced quoting is an error, an empty command
///   means "no filter".
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BuildLoggerConfig> {
    let raw_config = load_from_path(&path)?;
    let config = BuildLoggerConfig::try_from(raw_config)?;
    Ok(config)
}

/// Apply `BUILDLOG_FILTER_CMD` / `BUILDLOG_LOG_PATH` from the process
/// environment on top of `cfg`.
pub fn apply_env_overrides(cfg: BuildLoggerConfig) -> Result<BuildLoggerConfig> {
    apply_overrides_from(cfg, |key| std::env::var(key).ok())
}

/// Same as [`apply_env_overrides`] with an explicit variable lookup.
///
/// A set-but-empty `BUILDLOG_FILTER_CMD` disables a filter configured in the
/// file; a set-but-empty `BUILDLOG_LOG_PATH` is ignored.
pub fn apply_overrides_from<F>(mut cfg: BuildLoggerConfig, lookup: F) -> Result<BuildLoggerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(FILTER_CMD_ENV) {
        cfg.filter = FilterCommand::parse(&raw)?;
        debug!(filter = ?cfg.filter, "filter command taken from {}", FILTER_CMD_ENV);
    }

    if let Some(path) = lookup(LOG_PATH_ENV).filter(|p| !p.is_empty()) {
        debug!(log_path = %path, "log path taken from {}", LOG_PATH_ENV);
        cfg.log_path = Some(PathBuf::from(path));
    }

    Ok(cfg)
}
