//! Configuration management
//!
//! Settings are read from an optional TOML file, then environment variables
//! override individual values. Anything missing falls back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "rocha-listings.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Local storage for cached listings and the login session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// How long cached listings stay fresh
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    /// Period of the background refresh in `watch` mode
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    /// Never shorter than one minute; zero in the file means one minute
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.max(1).saturating_mul(60))
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join("session.json")
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl_minutes: default_ttl_minutes(),
            refresh_interval_minutes: default_refresh_interval_minutes(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("rocha-listings")
}

fn default_ttl_minutes() -> u64 {
    60
}

fn default_refresh_interval_minutes() -> u64 {
    120
}

/// Public site details used for share links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_url")]
    pub url: String,
    #[serde(default = "default_whatsapp_phone")]
    pub whatsapp_phone: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_site_url(),
            whatsapp_phone: default_whatsapp_phone(),
        }
    }
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_whatsapp_phone() -> String {
    "59898384860".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load from `path` if given, else from `rocha-listings.toml` when present,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse TOML config")
    }

    /// Environment variables take precedence over file values
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LISTINGS_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = lookup("LISTINGS_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.api.timeout_secs = secs;
        }
        if let Some(dir) = lookup("LISTINGS_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(minutes) = lookup("LISTINGS_CACHE_TTL_MINUTES").and_then(|v| v.parse().ok()) {
            self.cache.ttl_minutes = minutes;
        }
        if let Some(url) = lookup("LISTINGS_SITE_URL") {
            self.site.url = url;
        }
        if let Some(level) = lookup("LISTINGS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}
