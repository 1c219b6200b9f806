//! Application configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

/// Configuration problems that stop the service from starting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8084`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset keeps orders in memory
/// - `REDIS_URL`: Redis URL; unset broadcasts in process only
/// - `CART_SERVICE_URL`: cart endpoint (default: `"http://cart-service:8083/api/cart"`)
/// - `JWT_SECRET`: HS256 key shared with the issuing service (required)
/// - `ORDERS_TOPIC`: fanout topic for order events (default: `"orders_exchange"`)
/// - `CALL_TIMEOUT_SECS`: per collaborator call (default: `5`)
/// - `CONNECT_TIMEOUT_SECS`: for database and broker connections (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub cart_service_url: String,
    pub jwt_secret: String,
    pub orders_topic: String,
    pub call_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: Duration| {
            var(key)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            redis_url: non_empty("REDIS_URL"),
            cart_service_url: non_empty("CART_SERVICE_URL").unwrap_or(defaults.cart_service_url),
            jwt_secret: var("JWT_SECRET").unwrap_or_default(),
            orders_topic: non_empty("ORDERS_TOPIC").unwrap_or(defaults.orders_topic),
            call_timeout: secs("CALL_TIMEOUT_SECS", defaults.call_timeout),
            connect_timeout: secs("CONNECT_TIMEOUT_SECS", defaults.connect_timeout),
        }
    }

    /// Refuses to run without a signing secret or with a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        self.validate_timeouts()
    }

    /// Refuses zero call and connect timeouts.
    pub fn validate_timeouts(&self) -> Result<(), ConfigError> {
        if self.call_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("CALL_TIMEOUT_SECS"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("CONNECT_TIMEOUT_SECS"));
        }
        Ok(())
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8084,
            log_level: "info".to_string(),
            database_url: None,
            redis_url: None,
            cart_service_url: "http://cart-service:8083/api/cart".to_string(),
            jwt_secret: String::new(),
            orders_topic: messaging::ORDERS_TOPIC.to_string(),
            call_timeout: checkout::DEFAULT_CALL_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
        }
    }
}
