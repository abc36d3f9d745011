use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info};

use super::PageRepository;
use crate::codegen::order_by_clause;
use crate::codegen::utils::quote_name;
use crate::core::{Clock, PageId, SystemClock, UserId};
use crate::ent_schema::{EntSchema, ModelDefinition};
use crate::error::{AppError, AppResult};
use crate::models::{NewPage, Page, PageChanges};
use crate::schemas::PageSchema;

const COLUMNS: &str = "id, title, body, created, updated, modified, creator_id";

/// SQLite implementation of page persistence
pub struct SqlitePageRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    model: ModelDefinition,
    table: String,
    order_by: String,
    auto_now: Vec<String>,
}

impl SqlitePageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let model = PageSchema::definition();
        let table = quote_name(&model.db_table());
        let order_by = order_by_clause(&model);
        let auto_now = model.auto_now_columns();
        Self {
            pool,
            clock,
            model,
            table,
            order_by,
            auto_now,
        }
    }

    fn validate_changes(&self, changes: &PageChanges) -> AppResult<()> {
        if let Some(title) = &changes.title {
            self.model.check_updatable("title")?;
            self.model.validate_text("title", title)?;
        }
        if let Some(body) = &changes.body {
            self.model.check_updatable("body")?;
            self.model.validate_text("body", body)?;
        }
        if changes.updated.is_some() {
            self.model.check_updatable("updated")?;
        }
        if changes.modified.is_some() {
            self.model.check_updatable("modified")?;
        }
        Ok(())
    }
}

#[async_trait]
impl PageRepository for SqlitePageRepository {
    async fn create(&self, page: NewPage) -> AppResult<Page> {
        self.model.validate_text("title", &page.title)?;
        self.model.validate_text("body", &page.body)?;

        let now = self.clock.now();
        let creator = page.creator;
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "INSERT INTO {} (title, body, updated, modified, creator_id",
            self.table
        ));
        for column in &self.auto_now {
            qb.push(", ").push(quote_name(column));
        }
        qb.push(") VALUES (");
        let mut values = qb.separated(", ");
        values
            .push_bind(page.title)
            .push_bind(page.body)
            .push_bind(page.updated)
            .push_bind(page.modified)
            .push_bind(creator);
        for _ in &self.auto_now {
            values.push_bind(now);
        }
        values.push_unseparated(")");

        let result = qb.build().execute(&self.pool).await?;

        let id = PageId::new(result.last_insert_rowid());
        info!(page_id = %id, creator = %creator, "Created page");
        self.get(id).await
    }

    async fn get(&self, id: PageId) -> AppResult<Page> {
        sqlx::query_as::<_, Page>(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            COLUMNS, self.table
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {} not found", id)))
    }

    async fn list(&self) -> AppResult<Vec<Page>> {
        let pages = sqlx::query_as::<_, Page>(&format!(
            "SELECT {} FROM {} {}",
            COLUMNS, self.table, self.order_by
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(pages)
    }

    async fn list_for_creator(&self, creator: UserId) -> AppResult<Vec<Page>> {
        let pages = sqlx::query_as::<_, Page>(&format!(
            "SELECT {} FROM {} WHERE creator_id = ? {}",
            COLUMNS, self.table, self.order_by
        ))
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;
        Ok(pages)
    }

    async fn update(&self, id: PageId, changes: PageChanges) -> AppResult<Page> {
        self.validate_changes(&changes)?;
        if changes.is_empty() {
            return self.get(id).await;
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", self.table));
        let mut assignments = qb.separated(", ");
        if let Some(title) = changes.title {
            assignments.push("title = ").push_bind_unseparated(title);
        }
        if let Some(body) = changes.body {
            assignments.push("body = ").push_bind_unseparated(body);
        }
        if let Some(updated) = changes.updated {
            assignments.push("updated = ").push_bind_unseparated(updated);
        }
        if let Some(modified) = changes.modified {
            assignments.push("modified = ").push_bind_unseparated(modified);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Page {} not found", id)));
        }

        debug!(page_id = %id, "Updated page");
        self.get(id).await
    }

    async fn delete(&self, id: PageId) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", self.table))
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(page_id = %id, "Deleted page");
        }
        Ok(deleted)
    }
}
