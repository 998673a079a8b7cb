// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::filter::FilterCommand;
use crate::errors::Result;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [logger]
/// log_path = "/var/log/build/foo.log.gz"
/// filter_cmd = "sed -e s/secret/XXX/"
///
/// [logger.env]
/// LC_ALL = "C"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub logger: LoggerSection,
}

/// `[logger]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggerSection {
    /// Destination log file. A `.gz` suffix enables gzip compression.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Raw filter command string, split with shell-word rules.
    #[serde(default)]
    pub filter_cmd: Option<String>,

    /// Environment for the filter process. When absent the filter inherits
    /// the environment of the current process.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
}

/// Validated, immutable configuration for a [`crate::BuildLogger`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildLoggerConfig {
    /// `Some` replaces the filter's environment entirely; `None` inherits.
    pub environment: Option<BTreeMap<String, String>>,
    pub log_path: Option<PathBuf>,
    pub filter: Option<FilterCommand>,
}

impl BuildLoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Tokenize and set the filter command. An empty command clears it.
    pub fn with_filter_cmd(mut self, raw: &str) -> Result<Self> {
        self.filter = FilterCommand::parse(raw)?;
        Ok(self)
    }

    pub fn with_environment(mut self, env: BTreeMap<String, String>) -> Self {
        self.environment = Some(env);
        self
    }
}
