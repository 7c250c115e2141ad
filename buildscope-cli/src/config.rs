//! Configuration module
//!
//! Reads user defaults from `~/.buildscope/config.yml` and combines them with
//! command-line flags into the settings the client runs with.

use anyhow::{Result, anyhow};
use buildscope_client::ClientConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::args::SelectionArgs;

/// Name of the per-user directory under the home directory
const LOCAL_DIR_NAME: &str = ".buildscope";

/// Defaults configured by the user
///
/// Every key is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Repository used when `--repository` is not given
    pub repository: Option<String>,
    /// Where finished builds are cached
    pub cache_dir: Option<PathBuf>,
    /// Maximum number of builds fetched at once
    pub concurrency: Option<usize>,
}

impl UserConfig {
    /// Per-user directory holding the config file and the build cache
    pub fn local_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(LOCAL_DIR_NAME)
    }

    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        Self::local_dir().join("config.yml")
    }

    /// Default location of the build cache
    pub fn default_cache_dir() -> PathBuf {
        Self::local_dir().join("builds")
    }

    /// Load the config file at `path`
    ///
    /// A missing file means no defaults. A file that cannot be read or parsed
    /// is reported and otherwise ignored.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Ignoring unreadable config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        Self::parse(&content).unwrap_or_else(|e| {
            warn!("Ignoring invalid config {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Parse a YAML config document; an empty document has no defaults
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Settings the CLI runs with
#[derive(Debug, Clone)]
pub struct Config {
    /// Client configuration derived from flags and user defaults
    pub client: ClientConfig,
}

impl Config {
    /// Combine command-line flags with user defaults
    ///
    /// # Errors
    /// Returns an error if neither the flags nor the config file name a
    /// repository, or the resulting client configuration is invalid.
    pub fn resolve(args: &SelectionArgs, user: UserConfig, config_path: &Path) -> Result<Self> {
        let repository = args
            .repository
            .clone()
            .or(user.repository)
            .filter(|repo| !repo.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No repository specified. Pass one (--repository) or configure a default in {}.",
                    config_path.display()
                )
            })?;

        let cache_dir = user.cache_dir.unwrap_or_else(UserConfig::default_cache_dir);
        let mut client = ClientConfig::new(repository, cache_dir);
        if let Some(concurrency) = user.concurrency {
            client = client.with_max_concurrency(concurrency);
        }

        client.validate()?;
        Ok(Self { client })
    }
}
