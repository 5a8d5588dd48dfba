//! Configuration management.
//!
//! Configuration is read from `~/.config/oddsync/config.toml` (or the path
//! given with `--config`). If the file doesn't exist, a default
//! configuration with comments is created.

pub mod commands;

pub use commands::CommandConfig;

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::WikiConfig;
use crate::transport::http::DEFAULT_TIMEOUT_SECS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Built-in HTTP client
    #[default]
    Http,
    /// Shell commands from the `[commands]` table
    Command,
}

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the local working copies
    pub directory: Option<PathBuf>,
    pub transport: TransportKind,
    pub timeout_secs: u64,
    pub wikis: Vec<WikiConfig>,
    pub commands: CommandConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: None,
            transport: TransportKind::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            wikis: Vec::new(),
            commands: CommandConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: config_path.clone(),
                source,
            },
            other => other,
        })?;

        tracing::debug!(
            "Loaded {} wikis from {}",
            config.wikis.len(),
            config_path.display()
        );
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for wiki in &self.wikis {
            if wiki.name.trim().is_empty() {
                return Err(ConfigError::Invalid("wiki with empty name".into()));
            }
            if wiki.name.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "wiki name {:?} contains '/'",
                    wiki.name
                )));
            }
            if !seen.insert(wiki.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "wiki {:?} is defined twice",
                    wiki.name
                )));
            }
        }
        Ok(())
    }

    /// Get the default config file path: `~/.config/oddsync/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("oddsync").join("config.toml"))
    }

    /// Directory for local copies: `directory` or `~/.local/share/oddsync/pages`.
    pub fn pages_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("pages")),
        }
    }

    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join("oddsync"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!("Created default configuration at {}", path.display());
        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# oddsync configuration

# Where local copies of pages are kept, one directory per wiki.
# Defaults to the platform data directory, e.g. ~/.local/share/oddsync/pages
# directory = "~/wiki"

# "http" uses the built-in client; "command" runs the [commands] below.
transport = "http"

# Timeout for HTTP requests in seconds
timeout_secs = 30

# One [[wikis]] table per wiki:
#
# [[wikis]]
# name = "EmacsWiki"
# url = "https://www.emacswiki.org/emacs"
# encoding = "utf-8"          # or "iso-8859-1"
# antispam_field = "question"
# username = "YourName"
# password = "admin secret"   # only needed for locked pages

[commands]
# Placeholders: {url} {page} {summary} {username} {password}
# {antispam_field} {antispam_value} {minor} {oldtime} {revision}
# {pattern} {file}. Values are shell-quoted; write {{ and }} for braces.
# Post and preview commands must print the HTTP status last.
#
# get = "curl --silent --get --data-urlencode id={page} {url}'?action=browse;raw=2'"
# history = "curl --silent --get --data-urlencode id={page} {url}'?action=history;raw=1'"
# index = "curl --silent {url}'?action=index;raw=1'"
# recent_changes = "curl --silent {url}'?action=rc;raw=1'"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::app::SyncError {
    fn from(e: ConfigError) -> Self {
        crate::app::SyncError::Config(e.to_string())
    }
}
