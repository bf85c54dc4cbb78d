//! Configuration management for the SAMADhi CLI
//!
//! Handles the credentials file location. Verbosity only affects logging
//! and is applied in `main`.

use crate::error::{CliError, Result};
use samadhi_store::DEFAULT_CREDENTIALS_PATH;
use std::path::{Path, PathBuf};

/// Environment variable overriding the credentials file location
pub const CREDENTIALS_ENV: &str = "SAMADHI_CREDENTIALS";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Credentials file path (`~` is expanded when the file is read)
    pub credentials_path: PathBuf,
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
        }
    }

    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
            if path.trim().is_empty() {
                return Err(CliError::config(format!("{CREDENTIALS_ENV} is set but empty")));
            }
            config.credentials_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Get the credentials file path
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Set the credentials file path
    pub fn set_credentials_path(&mut self, path: PathBuf) {
        self.credentials_path = path;
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
