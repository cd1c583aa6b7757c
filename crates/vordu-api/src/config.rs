//! Server configuration
//!
//! Resolution order: defaults, TOML file, environment, command line.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Listen address when none is configured
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
/// Database file, relative to the working directory
pub const DEFAULT_DATABASE_URL: &str = "vordu.db";
/// Built dashboard directory
pub const DEFAULT_UI_DIR: &str = "ui/dist";
/// Dashboard origins allowed by CORS
pub const DEFAULT_CORS_ORIGINS: [&str; 2] =
    ["http://localhost:5173", "https://vordu.siliconsaga.org"];

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid bind address '{0}'")]
    Bind(String),
}

/// Runtime settings for the API server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database_url: String,
    /// Shared secret for protected endpoints; `None` leaves them open
    pub api_key: Option<String>,
    pub ui_dir: PathBuf,
    pub cors_origins: Vec<String>,
}

/// Partial configuration, as read from a file, the environment or flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub ui_dir: Option<PathBuf>,
    pub cors_origins: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// Read overrides from a TOML file
    ///
    /// # Errors
    /// Unreadable files and invalid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse overrides from TOML text
    ///
    /// # Errors
    /// Invalid TOML or unknown keys.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read overrides from an environment lookup
    ///
    /// Recognizes `VORDU_BIND`, `DATABASE_URL`, `VORDU_API_KEY` and
    /// `VORDU_UI_DIR`.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind: lookup("VORDU_BIND"),
            database_url: lookup("DATABASE_URL"),
            api_key: lookup("VORDU_API_KEY"),
            ui_dir: lookup("VORDU_UI_DIR").map(PathBuf::from),
            cors_origins: None,
        }
    }

    /// Read overrides from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Layer `other` on top of `self`
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            bind: other.bind.or(self.bind),
            database_url: other.database_url.or(self.database_url),
            api_key: other.api_key.or(self.api_key),
            ui_dir: other.ui_dir.or(self.ui_dir),
            cors_origins: other.cors_origins.or(self.cors_origins),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            api_key: None,
            ui_dir: PathBuf::from(DEFAULT_UI_DIR),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| (*o).to_string()).collect(),
        }
    }
}

impl ServerConfig {
    /// Apply overrides over the defaults
    ///
    /// An empty API key counts as unset.
    ///
    /// # Errors
    /// `ConfigError::Bind` if the bind address does not parse.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let bind = match overrides.bind {
            Some(bind) => bind.parse().map_err(|_| ConfigError::Bind(bind))?,
            None => defaults.bind,
        };
        Ok(Self {
            bind,
            database_url: overrides.database_url.unwrap_or(defaults.database_url),
            api_key: overrides.api_key.filter(|k| !k.is_empty()),
            ui_dir: overrides.ui_dir.unwrap_or(defaults.ui_dir),
            cors_origins: overrides.cors_origins.unwrap_or(defaults.cors_origins),
        })
    }

    /// Use a specific API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Serve the dashboard from `dir`
    #[must_use]
    pub fn with_ui_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ui_dir = dir.into();
        self
    }
}
