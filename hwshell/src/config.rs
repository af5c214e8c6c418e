//! JSON session configuration (`-c <file>`)

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can not read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Session defaults loaded before flag processing; command-line flags win
/// over file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Main-block prompt text (sub-block prompts are fixed).
    pub prompt: String,
    /// Page long listings through `-more-`.
    pub pager: bool,
    /// Echo trace log entries to stderr.
    pub debug: bool,
    /// Default management host.
    pub host: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "hwshell> ".to_string(),
            pager: true,
            debug: false,
            host: None,
        }
    }
}

impl ShellConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
