use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::config::{Config, DatabaseConfig};
use crate::error::{AppError, AppResult};

// SQLite connection pool with foreign keys enforced on every connection
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if !config.url.starts_with("sqlite:") {
            return Err(AppError::ConfigurationError(format!(
                "DATABASE_URL must be a sqlite: URL, got '{}'",
                config.url
            )));
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid DATABASE_URL '{}': {}", config.url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if is_in_memory(&config.url) {
            // Every connection to :memory: is a separate database, so keep
            // exactly one alive for the lifetime of the pool
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to {}: {}", config.url, e))
        })?;

        info!(url = %config.url, "Connected to database");
        Ok(Self { pool })
    }

    pub async fn in_memory() -> AppResult<Self> {
        Self::connect(&Config::in_memory().database).await
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[test]
    fn test_in_memory_detection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:pages?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:data/website.db"));
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();

        let row = sqlx::query("PRAGMA foreign_keys")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>(0), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_configuration_error() {
        let config = DatabaseConfig {
            url: "postgres://localhost/website".to_string(),
            max_connections: 1,
        };
        let result = Database::connect(&config).await;
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));

        let config = DatabaseConfig {
            url: "data/website.db".to_string(),
            max_connections: 1,
        };
        let result = Database::connect(&config).await;
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }
}
