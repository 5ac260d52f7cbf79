//! Summer configuration (summer.toml)

use crate::device::MAX_SESSIONS;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "summer.toml";
pub const DEFAULT_PORT: u16 = 7240;
pub const DEFAULT_READ_BUFFER: usize = 4096;
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 300_000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummerConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Device settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Number of sessions the ledger holds before dropping new ones
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Host service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Buffer size used for a READ that names no capacity
    #[serde(default = "default_read_buffer")]
    pub read_buffer: usize,

    /// Close a session after this long without a request (0 = never)
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

fn default_capacity() -> usize {
    MAX_SESSIONS
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_read_buffer() -> usize {
    DEFAULT_READ_BUFFER
}

fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT_MS
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_buffer: default_read_buffer(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl SummerConfig {
    /// Load `summer.toml` from `dir`, falling back to defaults when absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_file(&path)
    }

    /// Load an explicit config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SummerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config to use: an explicit path, else `./summer.toml`,
    /// else `~/.summer/summer.toml`, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        let cwd = std::env::current_dir()?;
        if cwd.join(CONFIG_FILE).exists() {
            return Self::load(&cwd);
        }

        match Self::user_config_dir() {
            Some(dir) => Self::load(&dir),
            None => Ok(Self::default()),
        }
    }

    /// `~/.summer`
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".summer"))
    }

    /// Save config to `dir/summer.toml`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.device.capacity == 0 {
            bail!("device.capacity must be at least 1");
        }
        if self.server.read_buffer == 0 {
            bail!("server.read_buffer must be at least 1");
        }
        Ok(())
    }

    /// `host:port` the server binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Idle limit for a session, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.server.idle_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SummerConfig::default();
        assert_eq!(config.device.capacity, 100);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.listen_addr(), "127.0.0.1:7240");
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(300)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = SummerConfig::load(temp.path()).unwrap();
        assert_eq!(config, SummerConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "[device]\ncapacity = 5\n\n[server]\nport = 9000\n",
        )
        .unwrap();

        let config = SummerConfig::load(temp.path()).unwrap();
        assert_eq!(config.device.capacity, 5);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.read_buffer, DEFAULT_READ_BUFFER);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let mut config = SummerConfig::default();
        config.device.capacity = 12;
        config.server.read_buffer = 256;

        let path = config.save(temp.path()).unwrap();
        assert!(path.exists());
        assert_eq!(SummerConfig::load(temp.path()).unwrap(), config);
    }

    #[test]
    fn test_zero_idle_timeout_disables_it() {
        let mut config = SummerConfig::default();
        config.server.idle_timeout_ms = 0;
        assert_eq!(config.idle_timeout(), None);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "[device]\ncapacity = 0\n").unwrap();
        let err = SummerConfig::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "device = [").unwrap();
        let err = SummerConfig::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_discover_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\n").unwrap();
        let config = SummerConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
