// src/config/validate.rs

use crate::config::filter::FilterCommand;
use crate::config::model::{BuildLoggerConfig, LoggerSection, RawConfigFile};
use crate::errors::{BuildLogError, Result};

impl TryFrom<RawConfigFile> for BuildLoggerConfig {
    type Error = BuildLogError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_logger_section(&raw.logger)?;

        let LoggerSection {
            log_path,
            filter_cmd,
            env,
        } = raw.logger;

        let filter = match filter_cmd {
            Some(raw_cmd) => FilterCommand::parse(&raw_cmd)?,
            None => None,
        };

        Ok(BuildLoggerConfig {
            environment: env,
            log_path,
            filter,
        })
    }
}

fn validate_logger_section(section: &LoggerSection) -> Result<()> {
    if let Some(path) = &section.log_path {
        if path.as_os_str().is_empty() {
            return Err(BuildLogError::ConfigError(
                "[logger].log_path must not be empty (omit it to discard output)".to_string(),
            ));
        }
    }

    if let Some(env) = &section.env {
        for key in env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(BuildLogError::ConfigError(format!(
                    "[logger.env] has invalid variable name {key:?}"
                )));
            }
        }
    }

    Ok(())
}
