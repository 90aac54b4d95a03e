//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, Utc};
use niaga_core::DEFAULT_TZ_OFFSET_HOURS;
use serde::Serialize;

/// Development signing key. Never use outside a dev machine.
pub const DEV_JWT_SECRET: &str = "niaga-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing session tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Session lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Send the session cookie with `Secure`
    pub cookie_secure: bool,

    /// Shown in export titles
    pub store_name: String,

    /// Business date offset from UTC in hours
    pub tz_offset_hours: i32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: parse_var("PORT", 8080)?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./niaga.db".to_string()),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // In production, this MUST be set via environment variable
                DEV_JWT_SECRET.to_string()
            }),

            jwt_lifetime_secs: parse_var("JWT_LIFETIME_SECS", 43_200)?, // 12 hours

            cookie_secure: parse_var("COOKIE_SECURE", false)?,

            store_name: env::var("STORE_NAME").unwrap_or_else(|_| "Niaga POS".to_string()),

            tz_offset_hours: parse_var("TZ_OFFSET_HOURS", DEFAULT_TZ_OFFSET_HOURS)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Defaults suitable for tests and local runs.
    pub fn development() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: "./niaga_dev.db".to_string(),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 43_200,
            cookie_secure: false,
            store_name: "Niaga POS".to_string(),
            tz_offset_hours: DEFAULT_TZ_OFFSET_HOURS,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 16 {
            return Err(ConfigError::InvalidValue("JWT_SECRET".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if !(-12..=14).contains(&self.tz_offset_hours) {
            return Err(ConfigError::InvalidValue("TZ_OFFSET_HOURS".to_string()));
        }
        Ok(())
    }

    /// True when the signing key was not configured.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The store's current business date.
    pub fn today(&self) -> NaiveDate {
        match FixedOffset::east_opt(self.tz_offset_hours * 3600) {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Utc::now().date_naive(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config_is_valid() {
        let config = ServerConfig::development();
        assert!(config.validate().is_ok());
        assert!(config.uses_dev_secret());
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = ServerConfig::development();
        config.jwt_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        let mut config = ServerConfig::development();
        config.tz_offset_hours = 20;
        assert!(config.validate().is_err());
    }
}
