#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use buildlog::config::{BuildLoggerConfig, FilterCommand, LoggerSection, RawConfigFile};

/// Builder for `BuildLoggerConfig` to simplify test setup.
pub struct ConfigBuilder {
    config: BuildLoggerConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: BuildLoggerConfig::default(),
        }
    }

    pub fn log_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.log_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the filter from a raw command string. Panics on bad quoting.
    pub fn filter(mut self, raw: &str) -> Self {
        self.config.filter = FilterCommand::parse(raw).expect("invalid filter command in test");
        self
    }

    /// Filter running `script` through `sh -c`.
    pub fn sh_filter(mut self, script: &str) -> Self {
        self.config.filter =
            FilterCommand::from_argv(vec!["sh".into(), "-c".into(), script.into()]);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .environment
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> BuildLoggerConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the raw TOML model, for exercising validation.
pub struct RawConfigBuilder {
    raw: RawConfigFile,
}

impl RawConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile {
                logger: LoggerSection::default(),
            },
        }
    }

    pub fn log_path(mut self, path: &str) -> Self {
        self.raw.logger.log_path = Some(path.into());
        self
    }

    pub fn filter_cmd(mut self, raw: &str) -> Self {
        self.raw.logger.filter_cmd = Some(raw.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.raw
            .logger
            .env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> RawConfigFile {
        self.raw
    }
}

impl Default for RawConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
