use axum::{extract::State, Json};
use booknest_core::error::AppError;

use crate::AppState;

/// Service health check; 503 when the database is unreachable.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.bookmarks.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
