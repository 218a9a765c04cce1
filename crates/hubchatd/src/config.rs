//! Daemon configuration.
//!
//! Loaded from a TOML file with three optional tables; every field has a
//! default, so an empty file (or no file at all) yields a working setup.
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8081"
//!
//! [hub]
//! inbox_capacity = 256
//! prune_empty_channels = false
//!
//! [session]
//! max_line_bytes = 4096
//! max_body_bytes = 1048576
//! body_timeout_ms = 5000
//! write_timeout_ms = 10000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use hubchat_protocol::codec::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_LINE_BYTES};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Default TCP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to accept client connections on (default: 0.0.0.0:8081).
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Hub settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    /// Capacity of the hub inbox shared by all sessions (default: 256).
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
    /// Delete a channel once its last member leaves (default: false,
    /// empty channels persist and keep showing up in CHNS).
    #[serde(default)]
    pub prune_empty_channels: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: default_inbox_capacity(),
            prune_empty_channels: false,
        }
    }
}

/// Per-connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Longest accepted command line (default: 4096).
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Largest accepted SEND body (default: 1 MiB).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// How long a declared SEND body may take to arrive (default: 5s).
    #[serde(default = "default_body_timeout_ms")]
    pub body_timeout_ms: u64,
    /// Upper bound on a single write to a client (default: 10s).
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl SessionConfig {
    pub fn body_timeout(&self) -> Duration {
        Duration::from_millis(self.body_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: default_max_line_bytes(),
            max_body_bytes: default_max_body_bytes(),
            body_timeout_ms: default_body_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_inbox_capacity() -> usize {
    256
}

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_body_timeout_ms() -> u64 {
    5_000
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse {
            error: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { error } => ConfigError::ParseFile {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Loads `path` if given. Otherwise loads the default location when a
    /// file exists there, and falls back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.inbox_capacity == 0 {
            return Err(ConfigError::Invalid("hub.inbox_capacity must be at least 1"));
        }
        if self.session.max_line_bytes == 0 {
            return Err(ConfigError::Invalid("session.max_line_bytes must be at least 1"));
        }
        if self.session.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("session.max_body_bytes must be at least 1"));
        }
        Ok(())
    }
}

/// Returns `<config dir>/hubchat/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hubchat").join("config.toml"))
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Failed to parse config: {error}")]
    Parse { error: String },

    #[error("Failed to parse config file {path}: {error}")]
    ParseFile { path: PathBuf, error: String },

    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}
