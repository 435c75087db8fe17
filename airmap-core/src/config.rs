use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

use crate::{provider::Endpoint, retry::RetryPolicy};

/// Environment variable that overrides every other base URL source.
pub const BASE_URL_ENV: &str = "AIRMAP_API_BASE_URL";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;

/// Request tuning stored under `[http]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Total attempts per click, including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// Forecast window requested from `air_weather`.
    pub hours: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30, max_attempts: 3, base_delay_ms: 500, hours: 48 }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Full service URL, e.g. "https://aq.example.org". Wins over host/port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Host used to derive the URL when `base_url` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default endpoint id, "coords" or "air_weather".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub http: HttpConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            host: None,
            port: DEFAULT_PORT,
            endpoint: None,
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// The configured endpoint, `coords` when none is set.
    pub fn default_endpoint(&self) -> Result<Endpoint> {
        match self.endpoint.as_deref() {
            Some(s) => Endpoint::try_from(s),
            None => Ok(Endpoint::default()),
        }
    }

    pub fn set_default_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoint = Some(endpoint.as_str().to_string());
    }

    /// Resolve the service base URL: environment override, then
    /// `base_url`, then `http://{host}:{port}`.
    pub fn resolve_base_url(&self) -> String {
        self.resolve_base_url_with(env::var(BASE_URL_ENV).ok())
    }

    pub fn resolve_base_url_with(&self, env_override: Option<String>) -> String {
        let explicit = env_override
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.base_url.clone().filter(|s| !s.trim().is_empty()));

        match explicit {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => {
                let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
                format!("http://{host}:{}", self.port)
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.http.max_attempts, Duration::from_millis(self.http.base_delay_ms))
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.default_endpoint()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "airmap", "airmap")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
