use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use booknest_core::error::AppError;

use crate::{
    dtos::bookmark::{CreateBookmarkRequest, ListBookmarksQuery},
    middleware::CurrentUser,
    models::{Bookmark, NewBookmark},
    utils::ValidatedJson,
    AppState,
};

/// `POST /bookmarks`
pub async fn create_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    let new_bookmark = NewBookmark {
        title: req.title.trim().to_string(),
        url: req.url.trim().to_string(),
        user_id: user.id,
    };

    let bookmark = state.bookmarks.insert_bookmark(&new_bookmark).await?;
    tracing::info!(user_id = %user.id, bookmark_id = %bookmark.id, "Bookmark created");

    Ok((StatusCode::CREATED, Json(bookmark)))
}

/// `GET /bookmarks?q=`
pub async fn list_bookmarks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListBookmarksQuery>,
) -> Result<Json<Vec<Bookmark>>, AppError> {
    let bookmarks = state
        .bookmarks
        .list_bookmarks(user.id, query.search())
        .await?;
    Ok(Json(bookmarks))
}
