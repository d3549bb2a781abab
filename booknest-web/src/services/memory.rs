//! In-memory repositories used by tests and local runs without PostgreSQL.

use async_trait::async_trait;
use booknest_core::error::AppError;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::repository::{AuthLogRepository, BookmarkRepository};
use crate::models::{AuthLogEntry, Bookmark, NewBookmark};

#[derive(Default)]
pub struct InMemoryStore {
    auth_logs: Mutex<Vec<AuthLogEntry>>,
    bookmarks: Mutex<Vec<Bookmark>>,
    fail_auth_logs: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Store mutex poisoned: {}", e)))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent audit insert fail with a database error.
    pub fn fail_auth_log_writes(&self, fail: bool) {
        self.fail_auth_logs.store(fail, Ordering::SeqCst);
    }

    pub fn auth_logs(&self) -> Vec<AuthLogEntry> {
        lock(&self.auth_logs).map(|l| l.clone()).unwrap_or_default()
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        lock(&self.bookmarks).map(|b| b.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuthLogRepository for InMemoryStore {
    async fn insert_auth_log(&self, entry: &AuthLogEntry) -> Result<(), AppError> {
        if self.fail_auth_logs.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "auth_logs insert rejected"
            )));
        }
        lock(&self.auth_logs)?.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl BookmarkRepository for InMemoryStore {
    async fn insert_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, AppError> {
        let created = Bookmark {
            id: Uuid::new_v4(),
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            user_id: bookmark.user_id,
            created_at: Utc::now(),
        };
        lock(&self.bookmarks)?.push(created.clone());
        Ok(created)
    }

    async fn list_bookmarks(
        &self,
        owner: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Bookmark>, AppError> {
        let bookmarks = lock(&self.bookmarks)?;
        // Insertion order breaks ties between equal timestamps.
        let mut found: Vec<Bookmark> = bookmarks
            .iter()
            .rev()
            .filter(|b| b.user_id == owner)
            .filter(|b| search.map_or(true, |s| b.matches(s)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
