//! Error types for the SAMADhi CLI
//!
//! Messages are user-facing and say how to fix the problem where that is
//! known.

use samadhi_common::{Categorized, ErrorCategory};
use samadhi_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Everything a CLI command can fail with
#[derive(Error, Debug)]
pub enum CliError {
    /// The arguments name a combination the command cannot serve
    #[error("{0}")]
    Usage(String),

    /// Catalog access failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check --credentials or the SAMADHI_CREDENTIALS variable.")]
    Config(String),

    /// Writing results failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create a usage error
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl Categorized for CliError {
    fn category(&self) -> ErrorCategory {
        match self {
            CliError::Usage(_) => ErrorCategory::Usage,
            CliError::Store(e) => e.category(),
            CliError::Config(_) => ErrorCategory::Configuration,
            CliError::Io(_) => ErrorCategory::Storage,
        }
    }
}
