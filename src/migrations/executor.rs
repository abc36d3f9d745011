// Migration executor - applies and reverses migrations against SQLite,
// recording progress in the `schema_migrations` table

use chrono::Utc;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{all_migrations, Migration, MigrationGraph, MigrationKey, ProjectState};
use crate::codegen::{DdlGenerator, Dialect};
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

pub const RECORDER_TABLE: &str = "schema_migrations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub key: MigrationKey,
    pub applied: bool,
}

pub struct MigrationExecutor {
    pool: SqlitePool,
    graph: MigrationGraph,
    auth: AuthConfig,
}

impl MigrationExecutor {
    pub fn new(pool: SqlitePool, migrations: Vec<Migration>, auth: AuthConfig) -> AppResult<Self> {
        let graph = MigrationGraph::new(migrations, &auth)?;
        Ok(Self { pool, graph, auth })
    }

    /// Executor over every migration shipped with the crate
    pub fn with_default_migrations(pool: SqlitePool, auth: AuthConfig) -> AppResult<Self> {
        Self::new(pool, all_migrations(), auth)
    }

    pub async fn ensure_recorder_table(&self) -> AppResult<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                app TEXT NOT NULL,
                name TEXT NOT NULL,
                applied TEXT NOT NULL,
                UNIQUE (app, name)
            )",
            RECORDER_TABLE
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::MigrationError(format!("Failed to create {} table: {}", RECORDER_TABLE, e))
        })?;
        Ok(())
    }

    pub async fn applied(&self) -> AppResult<BTreeSet<MigrationKey>> {
        self.ensure_recorder_table().await?;
        let rows = sqlx::query(&format!("SELECT app, name FROM {}", RECORDER_TABLE))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> AppResult<MigrationKey> {
                Ok(MigrationKey {
                    app_label: row.try_get("app")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    /// Apply every unapplied migration in plan order; returns what was applied
    pub async fn migrate(&self) -> AppResult<Vec<MigrationKey>> {
        let applied = self.applied().await?;
        self.check_consistent_history(&applied)?;

        let mut state = ProjectState::new();
        let mut newly_applied = Vec::new();

        for migration in self.graph.plan() {
            let key = migration.key();
            if !applied.contains(&key) {
                self.apply_migration(migration, &state).await?;
                newly_applied.push(key);
            }
            state.apply(migration);
        }

        if newly_applied.is_empty() {
            info!("No migrations to apply");
        }
        Ok(newly_applied)
    }

    /// Reverse every applied migration of `app_label` and everything that
    /// depends on it, newest first
    pub async fn unapply_app(&self, app_label: &str) -> AppResult<Vec<MigrationKey>> {
        if !self.graph.has_app(app_label) {
            return Err(AppError::MigrationError(format!(
                "App '{}' does not have migrations",
                app_label
            )));
        }

        let applied = self.applied().await?;
        let roots: BTreeSet<MigrationKey> = applied
            .iter()
            .filter(|key| key.app_label == app_label)
            .cloned()
            .collect();
        let targets = self.graph.descendants(&roots);

        let mut reversed = Vec::new();
        for migration in self.graph.plan().into_iter().rev() {
            let key = migration.key();
            if targets.contains(&key) && applied.contains(&key) {
                self.unapply_migration(migration).await?;
                reversed.push(key);
            }
        }
        Ok(reversed)
    }

    pub async fn show(&self) -> AppResult<Vec<MigrationStatus>> {
        let applied = self.applied().await?;
        Ok(self
            .graph
            .plan()
            .into_iter()
            .map(|migration| {
                let key = migration.key();
                MigrationStatus {
                    applied: applied.contains(&key),
                    key,
                }
            })
            .collect())
    }

    /// Forward SQL of one migration, without touching the database
    pub fn sql_for(&self, app_label: &str, name: &str, dialect: Dialect) -> AppResult<Vec<String>> {
        let key = MigrationKey::new(app_label, name);
        let migration = self
            .graph
            .get(&key)
            .ok_or_else(|| AppError::NotFound(format!("Migration {} does not exist", key)))?;
        let state = ProjectState::from_migrations(self.graph.plan_before(&key));
        self.forward_sql(migration, &state, dialect)
    }

    fn forward_sql(
        &self,
        migration: &Migration,
        state: &ProjectState,
        dialect: Dialect,
    ) -> AppResult<Vec<String>> {
        let mut state = state.clone();
        let mut statements = Vec::new();
        for operation in &migration.operations {
            let generator = DdlGenerator::new(dialect, state.registry(), &self.auth);
            statements.extend(operation.database_forwards(&generator)?);
            operation.state_forwards(&mut state);
        }
        Ok(statements)
    }

    fn check_consistent_history(&self, applied: &BTreeSet<MigrationKey>) -> AppResult<()> {
        for key in applied {
            for parent in self.graph.dependencies_of(key) {
                if !applied.contains(parent) {
                    return Err(AppError::MigrationError(format!(
                        "Migration {} is applied before its dependency {}",
                        key, parent
                    )));
                }
            }
        }
        Ok(())
    }

    async fn apply_migration(&self, migration: &Migration, state: &ProjectState) -> AppResult<()> {
        let key = migration.key();
        let statements = self.forward_sql(migration, state, Dialect::Sqlite)?;

        let mut tx = self.pool.begin().await?;
        for statement in &statements {
            debug!(migration = %key, "{}", statement);
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::MigrationError(format!("Failed to apply {}: {}", key, e)))?;
        }
        sqlx::query(&format!(
            "INSERT INTO {} (app, name, applied) VALUES (?, ?, ?)",
            RECORDER_TABLE
        ))
        .bind(&key.app_label)
        .bind(&key.name)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        for operation in &migration.operations {
            info!(migration = %key, "Applied: {}", operation.describe());
        }
        Ok(())
    }

    async fn unapply_migration(&self, migration: &Migration) -> AppResult<()> {
        let key = migration.key();
        // Dropping a table needs no model resolution
        let state = ProjectState::new();
        let generator = DdlGenerator::new(Dialect::Sqlite, state.registry(), &self.auth);

        let mut tx = self.pool.begin().await?;
        for operation in migration.operations.iter().rev() {
            for statement in operation.database_backwards(&generator) {
                debug!(migration = %key, "{}", statement);
                sqlx::query(&statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::MigrationError(format!("Failed to unapply {}: {}", key, e))
                    })?;
            }
        }
        sqlx::query(&format!(
            "DELETE FROM {} WHERE app = ? AND name = ?",
            RECORDER_TABLE
        ))
        .bind(&key.app_label)
        .bind(&key.name)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(migration = %key, "Unapplied");
        Ok(())
    }
}
