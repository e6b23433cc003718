// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use super::PageStore;
use crate::{
    error::AppError,
    models::page::{NewPage, Page},
};

/// `pages` table in Postgres.
#[derive(Clone)]
pub struct PgPageStore {
    pool: PgPool,
}

impl PgPageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl PageStore for PgPageStore {
    async fn insert(&self, page: NewPage) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO pages (html, original_url)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&page.html)
        .bind(&page.original_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert page: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Page>, AppError> {
        let page = sqlx::query_as::<_, Page>(
            r#"
            SELECT id, html, original_url, created_at
            FROM pages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(page)
    }
}
