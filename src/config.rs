//! Session configuration.
//!
//! All settings have defaults, so an empty file (or no file) is valid.
//!
//! # Configuration File
//!
//! ```toml
//! # Seconds of silence before a keepalive probe is sent (minimum 1)
//! keepalive_interval_secs = 5
//!
//! # Upper bound on one readiness wait in the session loop
//! poll_timeout_ms = 10
//!
//! # Largest chunk read from local input per tick
//! read_chunk_size = 16384
//!
//! [handshake]
//! max_attempts = 3
//! response_polls = 3
//! response_timeout_ms = 1000
//! ```

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keepalive interval used when none (or an invalid one) is configured
pub const DEFAULT_KEEPALIVE_SECS: u64 = 5;

/// Local input read size
pub const DEFAULT_READ_CHUNK: usize = 16 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle seconds before a probe; values below 1 fall back to the default
    pub keepalive_interval_secs: u64,
    /// Readiness wait per loop tick
    pub poll_timeout_ms: u64,
    /// Bytes read from local input per tick
    pub read_chunk_size: usize,
    /// Connection negotiation settings
    pub handshake: HandshakeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: DEFAULT_KEEPALIVE_SECS,
            poll_timeout_ms: 10,
            read_chunk_size: DEFAULT_READ_CHUNK,
            handshake: HandshakeConfig::default(),
        }
    }
}

/// Handshake retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Outer connect attempts before giving up
    pub max_attempts: u32,
    /// Readiness polls for the initial response per attempt
    pub response_polls: u32,
    /// Length of each poll
    pub response_timeout_ms: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            response_polls: 3,
            response_timeout_ms: 1000,
        }
    }
}

impl HandshakeConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl SessionConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!("Loading configuration from {}", path.display());

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;

        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Keepalive interval with the minimum applied
    pub fn keepalive_interval(&self) -> Duration {
        let secs = if self.keepalive_interval_secs < 1 {
            DEFAULT_KEEPALIVE_SECS
        } else {
            self.keepalive_interval_secs
        };
        Duration::from_secs(secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Read chunk size, never zero
    pub fn read_chunk_size(&self) -> usize {
        self.read_chunk_size.max(1)
    }
}
