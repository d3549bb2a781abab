use serde::Deserialize;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookmarkRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 500, message = "Title is too long")
    )]
    pub title: String,

    #[validate(
        custom(function = "not_blank", message = "URL is required"),
        length(max = 2048, message = "URL is too long")
    )]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBookmarksQuery {
    /// Case-insensitive substring of title or url.
    pub q: Option<String>,
}

impl ListBookmarksQuery {
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
