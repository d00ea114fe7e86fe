//! SDP Configuration Module
//!
//! Paths, retry budget and the executor command.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables (`SDP_*`)
//! 3. Project config (`.sdp/config.toml`)
//! 4. User config (`~/.config/sdp/config.toml`)
//! 5. Defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SdpError};
use crate::runtime::{Backoff, RetryPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SdpConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,

    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub executor: ExecutorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Retries after the first attempt of a workstream
    pub max_retries: u32,

    /// Delay between attempts in milliseconds (0 = retry immediately)
    pub retry_delay_ms: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathSettings {
    pub checkpoint_dir: PathBuf,
    pub workstream_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from(".sdp/checkpoints"),
            workstream_dir: PathBuf::from("docs/workstreams/backlog"),
        }
    }
}

/// Command run once per workstream as `<command> <args...> <ws_id>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorSettings {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            command: "sdp".to_string(),
            args: vec!["build".to_string()],
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_value(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SdpError::ConfigError {
                reason: format!("{key} must be a non-negative integer, got '{raw}'"),
            }),
        None => Ok(None),
    }
}

impl SdpConfig {
    /// Get the user config directory
    ///
    /// Returns `~/.config/sdp/` on Unix, `%APPDATA%/sdp/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sdp")
    }

    /// Get the user config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Project config path, relative to the working directory
    pub fn project_path() -> PathBuf {
        PathBuf::from(".sdp").join("config.toml")
    }

    /// Load the project config, else the user config, else defaults.
    ///
    /// Returns error if a file exists but is malformed.
    pub fn load() -> Result<Self> {
        for path in [Self::project_path(), Self::config_path()] {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SdpError::ConfigError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| SdpError::ConfigError {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save to the user config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save to `path`, creating parent directories if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| SdpError::ConfigError {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| SdpError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| SdpError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    /// Empty variables are ignored.
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(dir) = env_value("SDP_CHECKPOINT_DIR") {
            self.paths.checkpoint_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_value("SDP_WORKSTREAM_DIR") {
            self.paths.workstream_dir = PathBuf::from(dir);
        }
        if let Some(retries) = env_number("SDP_MAX_RETRIES")? {
            self.orchestrator.max_retries = retries;
        }
        if let Some(delay) = env_number("SDP_RETRY_DELAY_MS")? {
            self.orchestrator.retry_delay_ms = delay;
        }
        if let Some(command) = env_value("SDP_EXECUTOR") {
            self.executor.command = command;
        }
        Ok(self)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.orchestrator.retry_delay_ms)
    }

    /// Retry policy for the configured budget and delay
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(self.orchestrator.max_retries);
        if self.orchestrator.retry_delay_ms > 0 {
            policy.with_backoff(Backoff::Fixed(self.retry_delay()))
        } else {
            policy
        }
    }
}
