use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use booknest_core::error::AppError;

use crate::{
    services::{ProviderError, ProviderUser},
    utils::cookies,
    AppState,
};

/// Resolve the access-token cookie to a provider user, or answer 401.
pub async fn require_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = cookies::access_token(&jar)
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Not signed in")))?;

    let user = state.identity.get_user(&token).await.map_err(|e| match e {
        ProviderError::Rejected { .. } => {
            tracing::debug!(error = %e, "Session token rejected");
            AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session"))
        }
        other => AppError::from(other),
    })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Extractor for the user attached by [`require_user`].
pub struct CurrentUser(pub ProviderUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<ProviderUser>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Session user missing from request extensions"))
        })?;

        Ok(CurrentUser(user.clone()))
    }
}
