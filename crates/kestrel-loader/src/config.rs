//! Loader configuration (kestrel.toml)
//!
//! Every key is optional; a missing file section falls back to the defaults
//! below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Default capacity of the filesystem probe limiter
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 10;

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Base URL used when no referrer is supplied (default: cwd directory URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,

    /// Working directory substituted for eval/REPL referrers (default: process cwd)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Extension appended to the second resolution candidate, without the dot
    pub source_extension: String,

    /// Specifier prefix that selects the builtin format
    pub builtin_prefix: String,

    /// Specifier that denotes out-of-band eval source
    pub eval_specifier: String,

    /// How many filesystem probes may be outstanding at once
    pub max_concurrent_probes: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            cwd: None,
            source_extension: "js".to_string(),
            builtin_prefix: "@rt/".to_string(),
            eval_specifier: "[eval]".to_string(),
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the loader cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_probes == 0 {
            return Err(ConfigError::Invalid(
                "max-concurrent-probes must be at least 1".to_string(),
            ));
        }

        if self.builtin_prefix.is_empty() {
            return Err(ConfigError::Invalid("builtin-prefix cannot be empty".to_string()));
        }

        if self.source_extension.is_empty() || self.source_extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "source-extension must be a bare extension, got '{}'",
                self.source_extension
            )));
        }

        if self.eval_specifier.is_empty() {
            return Err(ConfigError::Invalid("eval-specifier cannot be empty".to_string()));
        }

        Ok(())
    }

    /// The working directory as a directory URL (trailing slash)
    pub fn cwd_url(&self) -> Result<Url, ConfigError> {
        let cwd = match &self.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir()?,
        };
        Url::from_directory_path(&cwd).map_err(|()| ConfigError::InvalidCwd(cwd))
    }

    /// The base URL, falling back to the working directory
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => self.cwd_url(),
        }
    }
}
