use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Whether the relational store is usable, decided once at startup.
///
/// The catalog and auth services receive this verdict instead of sniffing
/// connection strings per call. Placeholder URLs (template values that were
/// never filled in) count as unconfigured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreConfig {
    Configured { url: String },
    Unconfigured,
}

/// Statically configured operator credentials used when no database backs
/// the user table. Development convenience, mirrored by the auth fallback.
#[derive(Clone, Debug, Deserialize)]
pub struct FallbackAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL; empty or placeholder means "run on mock data"
    #[serde(default)]
    pub database_url: String,

    /// JWT signing secret for admin session tokens
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Root directory for stored upload files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Public base URL under which uploaded files are served
    #[serde(default = "default_upload_base_url")]
    pub upload_base_url: String,

    /// Path of the persisted site-settings blob
    #[serde(default = "default_settings_path")]
    pub settings_path: String,

    /// Operator credentials accepted when the store is unconfigured
    #[serde(default)]
    pub fallback_admin: Option<FallbackAdmin>,
}

fn default_jwt_expiration() -> u64 {
    86_400 // 24 hours, matching the admin session lifetime of the site
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_upload_base_url() -> String {
    "/uploads".to_string()
}

fn default_settings_path() -> String {
    "data/site_settings.json".to_string()
}

impl AppConfig {
    /// Decide whether the configured database URL is actually usable.
    pub fn store_config(&self) -> StoreConfig {
        let url = self.database_url.trim();
        if url.is_empty() || url.contains("your_") || url == "postgres://example" {
            return StoreConfig::Unconfigured;
        }
        StoreConfig::Configured {
            url: url.to_string(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Initializes tracing using the provided log level as the default filter.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("devfolio_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration.
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config file (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;

    if app_config.store_config() == StoreConfig::Unconfigured {
        warn!("Database URL missing or placeholder; public reads will serve the mock catalog");
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt_secret: "a_sufficiently_long_signing_secret_for_tests".into(),
            jwt_expiration: 3600,
            host: "127.0.0.1".into(),
            port: 8080,
            environment: "development".into(),
            log_level: "info".into(),
            log_json: false,
            auto_migrate: false,
            upload_dir: "uploads".into(),
            upload_base_url: "/uploads".into(),
            settings_path: "data/site_settings.json".into(),
            fallback_admin: None,
        }
    }

    #[test]
    fn configured_url_is_detected() {
        let cfg = base_config();
        assert_eq!(
            cfg.store_config(),
            StoreConfig::Configured {
                url: "sqlite::memory:".into()
            }
        );
    }

    #[test]
    fn empty_url_is_unconfigured() {
        let mut cfg = base_config();
        cfg.database_url = "".into();
        assert_eq!(cfg.store_config(), StoreConfig::Unconfigured);
    }

    #[test]
    fn placeholder_url_is_unconfigured() {
        let mut cfg = base_config();
        cfg.database_url = "postgres://your_database_host/app".into();
        assert_eq!(cfg.store_config(), StoreConfig::Unconfigured);
    }

    #[test]
    fn short_jwt_secret_fails_validation() {
        let mut cfg = base_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }
}
