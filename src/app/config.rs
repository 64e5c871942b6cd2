//! Configuration for the input driver

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest escape timeout accepted from a config file
const MAX_ESCAPE_TIMEOUT_MS: u64 = 10_000;

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Idle time before a held escape sequence is released as keystrokes
    pub escape_timeout_ms: u64,
    /// Mouse reporting settings
    pub mouse: MouseConfig,
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escape_timeout_ms: 50,
            mouse: MouseConfig::default(),
            log_filter: "warn".to_string(),
        }
    }
}

/// Mouse reporting configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    /// Route SGR mouse reports to the driver instead of passing them through
    pub enabled: bool,
}

impl Config {
    /// Escape timeout as a `Duration`
    pub fn escape_timeout(&self) -> Duration {
        Duration::from_millis(self.escape_timeout_ms)
    }

    /// Check values a config file could get wrong
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.escape_timeout_ms == 0 || self.escape_timeout_ms > MAX_ESCAPE_TIMEOUT_MS {
            return Err(ConfigError::Invalid {
                field: "escape_timeout_ms",
                value: self.escape_timeout_ms.to_string(),
                expected: "1..=10000 milliseconds",
            });
        }
        Ok(())
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                Self::default()
            },
        }
    }
}

/// `$HOME/.config/ansi-response/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("ansi-response")
            .join("config.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field}: {value} (expected {expected})")]
    Invalid {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}
