//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::Level;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Document database configuration (MongoDB)
    pub database: DatabaseSettings,

    /// Distributed cache configuration (Redis)
    pub cache: CacheSettings,

    /// Log sink configuration
    pub logging: LoggingSettings,

    /// Current environment (development, production, ...)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// MongoDB configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Connection string, e.g. "mongodb://localhost:27017"
    pub url: String,

    /// Database name to open on the connected client
    pub name: String,

    /// Connection/server-selection timeout in seconds
    pub connect_timeout: u64,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Redis connection URL
    pub url: String,
}

/// Log sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// File receiving entries at level ERROR and above
    pub error_file: String,

    /// File receiving entries at level INFO and above
    pub combined_file: String,

    /// Severity used when the database connection attempt fails.
    /// The upstream service logged this at "info", which mislabels a
    /// connectivity failure; the default here is "error".
    pub connect_failure_severity: String,
}

/// The environment value that suppresses the console sink.
pub const PRODUCTION_ENV: &str = "production";

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{environment}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// if the database URL is missing, or if the connect-failure severity
    /// is not a valid level name.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment. NODE_ENV is honored for
        // compatibility with the service's previous deployment scripts.
        let environment = std::env::var("RUN_ENV")
            .or_else(|_| std::env::var("NODE_ENV"))
            .unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.name", "graphql-service")?
            .set_default("database.connect_timeout", 30)?
            // The Redis client library falls back to localhost when no
            // host is configured; mirror that here.
            .set_default("cache.url", "redis://127.0.0.1:6379")?
            .set_default("logging.error_file", "error.log")?
            .set_default("logging.combined_file", "combined.log")?
            .set_default("logging.connect_failure_severity", "error")?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=5000 -> server.port = 5000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map the legacy environment variable names
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("database.url", std::env::var("MONGODB").ok())?
            .set_override_option("cache.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "cache.url",
                std::env::var("redisServer").ok().map(cache_url_from_host),
            )?
            .build()?;

        // The database URL has no sensible default; fail loudly before
        // deserialization so the message names the expected variables.
        if config.get_string("database.url").is_err() {
            return Err(ConfigError::Message(
                "database.url is required (set MONGODB or DATABASE_URL)".into(),
            ));
        }

        config.try_deserialize().and_then(|settings: Self| {
            settings.logging.connect_failure_level().map_err(|name| {
                ConfigError::Message(format!(
                    "logging.connect_failure_severity must be a level name \
                     (error, warn, info, debug, trace), got '{}'",
                    name
                ))
            })?;
            Ok(settings)
        })
    }

    /// Whether the console log sink should be suppressed.
    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION_ENV
    }
}

/// `redisServer` historically carried a bare host name rather than a URL.
fn cache_url_from_host(host: String) -> String {
    if host.contains("://") {
        host
    } else {
        format!("redis://{}", host)
    }
}

impl LoggingSettings {
    /// Parse the configured connect-failure severity into a tracing level.
    ///
    /// Returns the offending string on failure so the caller can report it.
    pub fn connect_failure_level(&self) -> Result<Level, String> {
        match self.connect_failure_severity.to_ascii_lowercase().as_str() {
            "error" => Ok(Level::ERROR),
            "warn" => Ok(Level::WARN),
            "info" => Ok(Level::INFO),
            "debug" => Ok(Level::DEBUG),
            "trace" => Ok(Level::TRACE),
            other => Err(other.to_string()),
        }
    }
}
