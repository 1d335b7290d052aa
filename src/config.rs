//! Daemon configuration
//!
//! A TOML file with environment-variable overrides, validated before
//! the loop starts. A non-positive scan interval is fatal here rather
//! than becoming a busy loop later.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SCAN_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_BRIDGE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_services_dir")]
    pub services_dir: PathBuf,
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: i64,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Local model binary, resolved through PATH when not absolute
    pub model_binary: PathBuf,
    pub model_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            model_binary: PathBuf::from("llama-local"),
            model_path: PathBuf::from("/models/gemma2b.gguf"),
            timeout_secs: DEFAULT_BRIDGE_TIMEOUT_SECS,
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn config_base_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("semd")
}

fn default_services_dir() -> PathBuf {
    config_base_dir().join("services")
}

fn default_schema_path() -> PathBuf {
    config_base_dir().join("service-schema.json")
}

fn default_scan_interval() -> i64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            services_dir: default_services_dir(),
            schema_path: default_schema_path(),
            scan_interval_secs: default_scan_interval(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Default location of the daemon configuration file
    pub fn default_config_path() -> PathBuf {
        config_base_dir().join("semd.toml")
    }

    /// Load configuration, apply environment overrides, and validate.
    ///
    /// With no explicit path, a missing default config file simply
    /// yields the defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::read_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(interval) = std::env::var("SEMD_SCAN_INTERVAL_SECS") {
            self.scan_interval_secs = interval.parse().unwrap_or(self.scan_interval_secs);
        }
        if let Ok(dir) = std::env::var("SEMD_SERVICES_DIR") {
            self.services_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("SEMD_SCHEMA_PATH") {
            self.schema_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_interval_secs <= 0 {
            bail!(
                "scan interval must be a positive number of seconds (got {})",
                self.scan_interval_secs
            );
        }
        if self.bridge.timeout_secs == 0 {
            bail!("bridge timeout must be a positive number of seconds");
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = RuntimeConfig {
            scan_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_interval_rejected() {
        let config = RuntimeConfig {
            scan_interval_secs: -5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semd.toml");
        let original = RuntimeConfig {
            services_dir: PathBuf::from("/srv/services"),
            schema_path: PathBuf::from("/srv/schema.json"),
            scan_interval_secs: 15,
            bridge: BridgeConfig::default(),
        };
        std::fs::write(&path, toml::to_string_pretty(&original).unwrap()).unwrap();

        let loaded = RuntimeConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.services_dir, original.services_dir);
        assert_eq!(loaded.scan_interval_secs, 15);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        assert!(RuntimeConfig::load(Some(Path::new("/no/such/semd.toml"))).is_err());
    }
}
