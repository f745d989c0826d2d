//! Reconciler configuration loading from JSON

use crate::wait::{Backoff, WaitConfig};
use custom_domain_common::defaults::{
    default_create_timeout_secs, default_delete_timeout_secs, default_max_poll_interval_secs,
    default_poll_interval_secs,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// poll_interval_secs is zero
    #[error("{phase}.poll_interval_secs must be greater than 0")]
    ZeroPollInterval { phase: &'static str },

    /// timeout_secs is zero
    #[error("{phase}.timeout_secs must be greater than 0")]
    ZeroTimeout { phase: &'static str },

    /// A single poll interval exceeds the whole deadline
    #[error("{phase}.poll_interval_secs ({poll}) exceeds {phase}.timeout_secs ({timeout})")]
    IntervalExceedsTimeout {
        phase: &'static str,
        poll: u64,
        timeout: u64,
    },

    /// Exponential cap is below the starting interval
    #[error("{phase}.max_poll_interval_secs ({max}) is below {phase}.poll_interval_secs ({poll})")]
    CapBelowInterval {
        phase: &'static str,
        max: u64,
        poll: u64,
    },

    /// Exponential cap is longer than the whole deadline
    #[error("{phase}.max_poll_interval_secs ({max}) exceeds {phase}.timeout_secs ({timeout})")]
    CapExceedsTimeout {
        phase: &'static str,
        max: u64,
        timeout: u64,
    },

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Delay growth between polls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Timing for one kind of wait, in whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    pub timeout_secs: u64,

    #[serde(default)]
    pub backoff: BackoffKind,

    /// Only used with exponential backoff
    #[serde(default = "default_max_poll_interval_secs")]
    pub max_poll_interval_secs: u64,
}

impl WaitSettings {
    fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs,
            backoff: BackoffKind::default(),
            max_poll_interval_secs: default_max_poll_interval_secs(),
        }
    }

    fn validate(&self, phase: &'static str) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval { phase });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout { phase });
        }
        if self.poll_interval_secs > self.timeout_secs {
            return Err(ConfigError::IntervalExceedsTimeout {
                phase,
                poll: self.poll_interval_secs,
                timeout: self.timeout_secs,
            });
        }
        if self.backoff == BackoffKind::Exponential
            && self.max_poll_interval_secs < self.poll_interval_secs
        {
            return Err(ConfigError::CapBelowInterval {
                phase,
                max: self.max_poll_interval_secs,
                poll: self.poll_interval_secs,
            });
        }
        if self.backoff == BackoffKind::Exponential && self.max_poll_interval_secs > self.timeout_secs
        {
            return Err(ConfigError::CapExceedsTimeout {
                phase,
                max: self.max_poll_interval_secs,
                timeout: self.timeout_secs,
            });
        }
        Ok(())
    }

    /// Runtime wait timing
    pub fn wait_config(&self) -> WaitConfig {
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max_delay: Duration::from_secs(self.max_poll_interval_secs),
                jitter: true,
            },
        };
        WaitConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            backoff,
        }
    }
}

fn default_create_settings() -> WaitSettings {
    WaitSettings::with_timeout(default_create_timeout_secs())
}

fn default_delete_settings() -> WaitSettings {
    WaitSettings::with_timeout(default_delete_timeout_secs())
}

/// Reconciler configuration
///
/// ```json
/// {
///   "create": { "poll_interval_secs": 5, "timeout_secs": 600 },
///   "delete": { "backoff": "exponential", "timeout_secs": 300 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Waiting for a new association to become active
    #[serde(default = "default_create_settings")]
    pub create: WaitSettings,

    /// Waiting for a disassociated domain to disappear
    #[serde(default = "default_delete_settings")]
    pub delete: WaitSettings,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            create: default_create_settings(),
            delete: default_delete_settings(),
        }
    }
}

impl ReconcilerConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.create.validate("create")?;
        self.delete.validate("delete")
    }
}
