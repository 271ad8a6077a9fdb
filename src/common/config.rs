//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment < CLI
use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Local development backend, used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
/// Single variable that overrides the backend base address.
pub const API_URL_ENV: &str = "FRAUDSHIELD_API_URL";

pub const MAX_SETTLE_MS: u64 = 10_000;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "fraudshield")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("fraudshield.toml"))
}

/// Where scan data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    #[default]
    Live,
    Fixture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Timing of the phases that follow a successful upload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Pause after the upload reaches 100% before scanning starts
    pub settle_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            settle_ms: 800,
            poll_interval_ms: 1_000,
            poll_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub show_progress: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderMode,
    pub api: ApiSettings,
    pub scan: ScanSettings,
    pub ui: UiSettings,
}

impl AppConfig {
    pub fn base_url(&self) -> Result<Url> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut raw = self.api.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("Invalid api.base_url '{}'", self.api.base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.scan.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.scan.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.scan.poll_timeout_secs)
    }

    /// Rejects values that would make a session hang or misbehave.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "Invalid config: api.base_url must use http or https"
        );
        ensure!(
            self.api.request_timeout_secs > 0,
            "Invalid config: api.request_timeout_secs must be > 0"
        );
        ensure!(
            self.api.request_timeout_secs <= MAX_REQUEST_TIMEOUT_SECS,
            "Invalid config: api.request_timeout_secs must be <= {MAX_REQUEST_TIMEOUT_SECS}"
        );
        ensure!(
            self.scan.settle_ms <= MAX_SETTLE_MS,
            "Invalid config: scan.settle_ms must be <= {MAX_SETTLE_MS}"
        );
        ensure!(
            self.scan.poll_interval_ms > 0,
            "Invalid config: scan.poll_interval_ms must be > 0"
        );
        ensure!(
            self.poll_timeout() >= self.poll_interval(),
            "Invalid config: scan.poll_timeout_secs must cover at least one poll_interval_ms"
        );
        Ok(())
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_progress: Option<bool>,
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();

    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("FRAUDSHIELD_").split("__"))
        .merge(Env::raw().only(&[API_URL_ENV]).map(|_| "api.base_url".into()))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

/// Applies runtime overrides to a loaded config.
pub fn apply_overrides(mut config: AppConfig, overrides: &ConfigOverrides) -> AppConfig {
    if let Some(url) = &overrides.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(provider) = overrides.provider {
        config.provider = provider;
    }
    if let Some(settle_ms) = overrides.settle_ms {
        config.scan.settle_ms = settle_ms;
    }
    if let Some(show_progress) = overrides.show_progress {
        config.ui.show_progress = show_progress;
    }

    config
}
