//! PostgreSQL-backed repositories.

use async_trait::async_trait;
use booknest_core::error::AppError;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::repository::{AuthLogRepository, BookmarkRepository};
use crate::models::{AuthLogEntry, Bookmark, NewBookmark};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl AuthLogRepository for Database {
    async fn insert_auth_log(&self, entry: &AuthLogEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO auth_logs (user_id, email, event)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.email)
        .bind(entry.event.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }
}

#[async_trait]
impl BookmarkRepository for Database {
    async fn insert_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, AppError> {
        sqlx::query_as::<_, Bookmark>(
            r#"
            INSERT INTO bookmarks (title, url, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, url, user_id, created_at
            "#,
        )
        .bind(&bookmark.title)
        .bind(&bookmark.url)
        .bind(bookmark.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn list_bookmarks(
        &self,
        owner: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Bookmark>, AppError> {
        let query = match search {
            Some(search) => sqlx::query_as::<_, Bookmark>(
                r#"
                SELECT id, title, url, user_id, created_at
                FROM bookmarks
                WHERE user_id = $1
                  AND (title ILIKE $2 ESCAPE '\' OR url ILIKE $2 ESCAPE '\')
                ORDER BY created_at DESC
                "#,
            )
            .bind(owner)
            .bind(like_pattern(search)),
            None => sqlx::query_as::<_, Bookmark>(
                r#"
                SELECT id, title, url, user_id, created_at
                FROM bookmarks
                WHERE user_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(owner),
        };

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
