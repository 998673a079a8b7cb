// src/config/mod.rs

//! Configuration for the logging pipeline.
//!
//! - [`model`] holds the raw TOML model and the validated
//!   [`BuildLoggerConfig`].
//! - [`filter`] tokenizes the filter command string.
//! - [`validate`] turns a raw model into a validated config.
//! - [`loader`] reads files and applies environment overrides.

pub mod filter;
pub mod loader;
pub mod model;
pub mod validate;

pub use filter::FilterCommand;
pub use loader::{
    apply_env_overrides, apply_overrides_from, load_and_validate, load_from_path,
    FILTER_CMD_ENV, LOG_PATH_ENV,
};
pub use model::{BuildLoggerConfig, LoggerSection, RawConfigFile};
