use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A saved link owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Bookmark {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Case-insensitive substring match on title or url.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.url.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub user_id: Uuid,
}
