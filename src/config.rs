use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use swapi_explorer_core::options::DEFAULT_CONCURRENCY;
use swapi_explorer_core::session::MIN_REFRESH_INTERVAL_SECS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
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
    "https://swapi.dev/api".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct FiltersConfig {
    /// Upper bound on in-flight label lookups per resource kind.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_resolutions: usize,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            max_concurrent_resolutions: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    DEFAULT_CONCURRENCY
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// File holding the persisted token (the local "storage").
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/session.json")
}
fn default_refresh_interval() -> u64 {
    MIN_REFRESH_INTERVAL_SECS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// All defaults; used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            api: ApiConfig::default(),
            filters: FiltersConfig::default(),
            session: SessionConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Collection root: `{base_url}/people/`.
    pub fn people_root(&self) -> String {
        format!("{}/people/", self.api.base_url.trim_end_matches('/'))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate api
    let base = &config.api.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!("api.base_url must start with http:// or https://");
    }
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    // Validate filters
    if config.filters.max_concurrent_resolutions == 0 {
        anyhow::bail!("filters.max_concurrent_resolutions must be >= 1");
    }

    // Validate session
    if config.session.refresh_interval_secs < MIN_REFRESH_INTERVAL_SECS {
        anyhow::bail!(
            "session.refresh_interval_secs must be >= {}",
            MIN_REFRESH_INTERVAL_SECS
        );
    }

    Ok(())
}
