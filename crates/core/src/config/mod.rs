//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FOODMAP_*)
//! 2. TOML config file (if FOODMAP_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Log output format for the binary's subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FOODMAP_*)
/// 2. TOML config file (if FOODMAP_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source document read by `ingest`.
    ///
    /// Set via FOODMAP_SOURCE_PATH environment variable.
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// Dataset artifact written by `ingest`.
    ///
    /// Set via FOODMAP_OUTPUT_PATH environment variable.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Path to the SQLite database backing the worker caches.
    ///
    /// Set via FOODMAP_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker is registered for; requests elsewhere are cross-origin.
    ///
    /// Set via FOODMAP_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Generation tag of the precached shell store.
    #[serde(default = "default_static_cache")]
    pub static_cache: String,

    /// Generation tag of the runtime store.
    #[serde(default = "default_runtime_cache")]
    pub runtime_cache: String,

    /// Shell assets fetched during install, as origin-relative paths.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Same-origin path prefix routed to the runtime store.
    #[serde(default = "default_runtime_prefix")]
    pub runtime_prefix: String,

    /// Hostname fragments identifying map-tile and webfont providers.
    ///
    /// Set via FOODMAP_PROVIDER_PATTERNS environment variable.
    #[serde(default = "default_provider_patterns")]
    pub provider_patterns: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FOODMAP_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FOODMAP_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via FOODMAP_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Log output format.
    ///
    /// Set via FOODMAP_LOG_FORMAT environment variable (`text` or `json`).
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("data/restaurants.md")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("src/lib/restaurants.json")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./foodmap-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:5173".into()
}

fn default_static_cache() -> String {
    "foodmap-v1".into()
}

fn default_runtime_cache() -> String {
    "foodmap-runtime".into()
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/manifest.json".into(), "/icon.svg".into()]
}

fn default_runtime_prefix() -> String {
    "/_app/".into()
}

fn default_provider_patterns() -> Vec<String> {
    vec!["tile".into(), "carto".into(), "openstreetmap".into()]
}

fn default_user_agent() -> String {
    "foodmap/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            output_path: default_output_path(),
            db_path: default_db_path(),
            origin: default_origin(),
            static_cache: default_static_cache(),
            runtime_cache: default_runtime_cache(),
            precache: default_precache(),
            runtime_prefix: default_runtime_prefix(),
            provider_patterns: default_provider_patterns(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FOODMAP_`
    /// 2. TOML file from `FOODMAP_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FOODMAP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FOODMAP_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
