//! TOML configuration under the platform config directory.
//!
//! Everything here is optional; CLI flags override config values, and the
//! built-in endpoint is used when neither specifies one.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// The demo chat worker this client was written against.
pub const DEFAULT_ENDPOINT: &str = "https://chatbot-demo-worker.homesecurity.rocks/";

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Chat worker URL; falls back to [`DEFAULT_ENDPOINT`].
    pub endpoint: Option<String>,
    /// Username prefilled into the session.
    pub username: Option<String>,
    /// Enable markdown rendering in the transcript pane (default on).
    pub markdown: Option<bool>,
}

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn StdError>> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, Box<dyn StdError>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
            let config: Config =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: config_path.to_path_buf(),
                    source,
                })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn StdError>> {
        self.save_to_path(&Self::config_path())
    }

    pub(crate) fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn StdError>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn StdError> { Box::new(err) })?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "chatelet")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    /// Endpoint with CLI override and built-in fallback applied.
    pub fn resolve_endpoint(&self, cli_endpoint: Option<&str>) -> String {
        cli_endpoint
            .or(self.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
            .to_string()
    }

    /// Username with CLI override; absent fields resolve to an empty field
    /// the user fills in interactively.
    pub fn resolve_username(&self, cli_username: Option<&str>) -> String {
        cli_username
            .or(self.username.as_deref())
            .unwrap_or("")
            .to_string()
    }
}
