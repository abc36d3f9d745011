use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Settings consumed by swappable model references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// `app_label.Model` of the model standing in for users
    pub user_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/website.db".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                user_model: "auth.User".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| {
                AppError::ConfigurationError(format!(
                    "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            Err(_) => defaults.database.max_connections,
        };

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections,
            },
            auth: AuthConfig {
                user_model: env::var("AUTH_USER_MODEL").unwrap_or(defaults.auth.user_model),
            },
        })
    }

    /// Config pointing at a private in-memory database
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.database.url = "sqlite::memory:".to_string();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.auth.user_model, "auth.User");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_in_memory_url() {
        assert_eq!(Config::in_memory().database.url, "sqlite::memory:");
    }
}
