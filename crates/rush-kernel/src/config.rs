//! User configuration loaded from `config.toml`.
//!
//! ```toml
//! [tools]
//! candidates = ["vim", "mate", "code"]   # default: ["vim", "mate"]
//! probe_arg = "--version"                # default
//! shell = "sh"                           # default
//! ```
//!
//! Every field is optional. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RushConfig {
    pub tools: ToolsConfig,
}

/// The `[tools]` table: which external tools to probe and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Candidate tool names, probed in order.
    pub candidates: Vec<String>,
    /// Argument passed to each candidate by the availability probe.
    pub probe_arg: String,
    /// Shell that runs probes and invocations (`<shell> -c <line>`).
    pub shell: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            candidates: vec!["vim".to_string(), "mate".to_string()],
            probe_arg: "--version".to_string(),
            shell: "sh".to_string(),
        }
    }
}

impl ToolsConfig {
    /// Replace the candidate list.
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }
}

impl RushConfig {
    /// `$XDG_CONFIG_HOME/rush/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rush").join("config.toml"))
    }

    /// Parse configuration text. `origin` is only used in error messages.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load an explicitly named config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text, path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from [`default_path`](Self::default_path), falling back to
    /// defaults when there is no such file.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load `path`, or return defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }
}
