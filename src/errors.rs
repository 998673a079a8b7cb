// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildLogError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Log writer failed to start: {0}")]
    WriterStart(String),

    /// The pipeline was cancelled. This is a control-flow outcome, not a
    /// failure, and callers should not treat it as one.
    #[error("pipeline cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildLogError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildLogError::Cancelled)
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildLogError>;
