use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

use super::UserRepository;
use crate::codegen::utils::quote_name;
use crate::config::AuthConfig;
use crate::core::{Clock, SystemClock, UserId};
use crate::ent_schema::{ModelDefinition, ModelRef, SwappableSetting};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::schemas::create_schema_registry;

/// SQLite implementation over whichever model AUTH_USER_MODEL names
pub struct SqliteUserRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    model: ModelDefinition,
    table: String,
    auto_now: Vec<String>,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool, auth: &AuthConfig) -> AppResult<Self> {
        Self::with_clock(pool, auth, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, auth: &AuthConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let registry = create_schema_registry();
        let model = registry
            .resolve(&ModelRef::Swappable(SwappableSetting::AuthUserModel), auth)
            .cloned()
            .ok_or_else(|| {
                AppError::ConfigurationError(format!(
                    "AUTH_USER_MODEL refers to unknown model '{}'",
                    auth.user_model
                ))
            })?;
        let table = quote_name(&model.db_table());
        let auto_now = model.auto_now_columns();

        Ok(Self {
            pool,
            clock,
            model,
            table,
            auto_now,
        })
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        self.model.validate_text("username", &user.username)?;

        let now = self.clock.now();
        let mut qb = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {} (username", self.table));
        for column in &self.auto_now {
            qb.push(", ").push(quote_name(column));
        }
        qb.push(") VALUES (");
        let mut values = qb.separated(", ");
        values.push_bind(user.username);
        for _ in &self.auto_now {
            values.push_bind(now);
        }
        values.push_unseparated(")");

        let result = qb.build().execute(&self.pool).await?;

        let id = UserId::new(result.last_insert_rowid());
        info!(user_id = %id, "Created user");
        self.get(id).await
    }

    async fn get(&self, id: UserId) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT id, username, date_joined FROM {} WHERE id = ?",
            self.table
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", self.table))
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(user_id = %id, "Deleted user and their pages");
        }
        Ok(deleted)
    }
}
