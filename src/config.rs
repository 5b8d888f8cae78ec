//! Local configuration management.
//!
//! Config is stored at `~/.config/sccreg/config.toml` and contains:
//! - registration server and default regcode
//! - products to activate on `sccreg up`
//! - request timeout and retry policy

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scc::DEFAULT_BASE_URL;
use crate::retry::RetryPolicy;
use crate::session::ProductSpec;

const CONFIG_DIR: &str = "sccreg";
const CONFIG_FILE: &str = "config.toml";

/// Local configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Registration server (default: https://scc.suse.com/connect).
    #[serde(default = "default_regserver")]
    pub regserver: String,

    /// Default system regcode.
    #[serde(default)]
    pub regcode: Option<String>,

    /// Whole-request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Products to activate, in order.
    #[serde(default)]
    pub products: Vec<ProductSpec>,
}

fn default_regserver() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            regserver: default_regserver(),
            regcode: None,
            timeout_secs: None,
            retry: RetryPolicy::default(),
            products: Vec::new(),
        }
    }
}

impl LocalConfig {
    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Check if a non-empty default regcode is configured.
    pub fn has_regcode(&self) -> bool {
        self.regcode
            .as_ref()
            .map(|r| !r.is_empty())
            .unwrap_or(false)
    }

    pub fn set_regcode(&mut self, regcode: String) {
        self.regcode = Some(regcode);
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = LocalConfig::default();
        assert!(config.regcode.is_none());
        assert_eq!(config.regserver, "https://scc.suse.com/connect");
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_has_regcode() {
        let mut config = LocalConfig::default();
        assert!(!config.has_regcode());

        config.set_regcode(String::new());
        assert!(!config.has_regcode());

        config.set_regcode("ABC".to_string());
        assert!(config.has_regcode());
    }

    #[test]
    fn test_parse_partial_file() {
        let config: LocalConfig = toml::from_str(
            r#"
            regcode = "R1"
            timeout_secs = 30

            [retry]
            max_attempts = 5

            [[products]]
            identifier = "SLES"
            version = "12.3"
            arch = "x86_64"

            [[products]]
            identifier = "sle-module-hpc"
            version = "12"
            arch = "x86_64"
            regcode = "R2"
            "#,
        )
        .unwrap();

        assert_eq!(config.regserver, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.max_delay_ms, 10_000);
        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[1].regcode.as_deref(), Some("R2"));
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sccreg").join("config.toml");

        let mut config = LocalConfig::default();
        config.set_regcode("ABC".to_string());
        config.regserver = "https://rmt.example.com/connect".to_string();
        config
            .products
            .push(ProductSpec::new("SLES", "15.5", "x86_64").with_regcode("R2"));
        config.save_to(&path).unwrap();

        assert_eq!(LocalConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = LocalConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, LocalConfig::default());
    }
}
