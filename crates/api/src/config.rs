//! Application configuration loaded from environment variables.

use domain::PhoneRegion;
use thiserror::Error;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A variable was set to something that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {var}: {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL connection string; the in-memory store is
///   used when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `PHONE_REGION`: region for national-format phone numbers (default: `ID`)
/// - `RUN_MIGRATIONS`: apply migrations on startup (default: `true`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub phone_region: PhoneRegion,
    pub run_migrations: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(v) => parse("PORT", v, |v| v.trim().parse::<u16>().ok())?,
            None => defaults.port,
        };
        let log_format = match get("LOG_FORMAT") {
            Some(v) => parse("LOG_FORMAT", v, |v| {
                match v.trim().to_ascii_lowercase().as_str() {
                    "text" | "pretty" => Some(LogFormat::Text),
                    "json" => Some(LogFormat::Json),
                    _ => None,
                }
            })?,
            None => defaults.log_format,
        };
        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => parse("DATABASE_MAX_CONNECTIONS", v, |v| {
                v.trim().parse::<u32>().ok().filter(|n| *n > 0)
            })?,
            None => defaults.database_max_connections,
        };
        let phone_region = match get("PHONE_REGION") {
            Some(v) => parse("PHONE_REGION", v, |v| PhoneRegion::from_code(v))?,
            None => defaults.phone_region,
        };
        let run_migrations = match get("RUN_MIGRATIONS") {
            Some(v) => parse("RUN_MIGRATIONS", v, |v| {
                match v.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" => Some(true),
                    "0" | "false" | "no" => Some(false),
                    _ => None,
                }
            })?,
            None => defaults.run_migrations,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: get("DATABASE_URL"),
            database_max_connections,
            phone_region,
            run_migrations,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(
    var: &'static str,
    value: String,
    parser: impl FnOnce(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    parser(&value).ok_or(ConfigError { var, value })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            phone_region: PhoneRegion::default(),
            run_migrations: true,
        }
    }
}
