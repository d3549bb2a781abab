use async_trait::async_trait;
use booknest_core::error::AppError;
use uuid::Uuid;

use crate::models::{AuthLogEntry, Bookmark, NewBookmark};

/// Append-only store for sign-in audit rows.
#[async_trait]
pub trait AuthLogRepository: Send + Sync {
    async fn insert_auth_log(&self, entry: &AuthLogEntry) -> Result<(), AppError>;
}

/// Owner-scoped bookmark storage.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    async fn insert_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, AppError>;

    /// The owner's bookmarks, newest first, optionally narrowed to those whose
    /// title or url contains `search` (case-insensitive).
    async fn list_bookmarks(
        &self,
        owner: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Bookmark>, AppError>;

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
