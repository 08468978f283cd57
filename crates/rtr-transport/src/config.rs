//! Cache configuration

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default RTR port over plain TCP
pub const DEFAULT_RTR_PORT: u16 = 323;

/// SSH credentials for a cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshCacheConfig {
    /// Username on the cache
    pub username: String,
    /// Router's private key
    pub private_key: PathBuf,
    /// known_hosts file with the cache's public host key
    pub cache_public_key: PathBuf,
}

/// Configuration of one remote cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Remote hostname or IP
    pub hostname: String,
    /// Remote port
    pub port: u16,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// SSH credentials; absent for non-SSH transports
    pub ssh: Option<SshCacheConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: DEFAULT_RTR_PORT,
            connect_timeout: 30,
            ssh: None,
        }
    }
}

impl CacheConfig {
    /// Create a configuration for the given cache
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ..Default::default()
        }
    }

    /// Use SSH with the given credentials
    pub fn with_ssh(
        mut self,
        username: impl Into<String>,
        private_key: impl Into<PathBuf>,
        cache_public_key: impl Into<PathBuf>,
    ) -> Self {
        self.ssh = Some(SshCacheConfig {
            username: username.into(),
            private_key: private_key.into(),
            cache_public_key: cache_public_key.into(),
        });
        self
    }

    /// Set connection timeout, rounded up to whole seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self
    }

    /// Connection timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.is_empty() {
            return Err(ConfigError::Invalid("hostname is empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".to_string()));
        }
        if self.connect_timeout == 0 {
            return Err(ConfigError::Invalid("connect timeout must not be 0".to_string()));
        }
        if let Some(ssh) = &self.ssh {
            if ssh.username.is_empty() {
                return Err(ConfigError::Invalid("ssh username is empty".to_string()));
            }
            if ssh.private_key.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("ssh private key path is empty".to_string()));
            }
            if ssh.cache_public_key.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("ssh cache public key path is empty".to_string()));
            }
        }
        Ok(())
    }
}
