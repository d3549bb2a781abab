//! Form-driven sign-in, registration and logout. Every outcome is a redirect.

use axum::{
    extract::{rejection::FormRejection, State},
    response::Redirect,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use booknest_core::error::AppError;
use url::Url;
use validator::Validate;

use crate::{
    dtos::auth::{LoginForm, SignupForm},
    services::SignUpRequest,
    utils::{cookies, pkce},
    AppState,
};

const CONFIRM_PATH: &str = "/auth/confirm";

fn error_redirect() -> Redirect {
    Redirect::to("/error")
}

fn confirm_url(site_url: &Url) -> Url {
    let mut url = site_url.clone();
    url.set_path(CONFIRM_PATH);
    url.set_query(None);
    url
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> (CookieJar, Redirect) {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::info!(error = %e, "Unreadable login form");
            return (jar, error_redirect());
        }
    };

    if let Err(e) = form.validate() {
        tracing::info!(error = %e, "Invalid login form");
        return (jar, error_redirect());
    }

    match state
        .identity
        .sign_in_with_password(&form.email, &form.password)
        .await
    {
        Ok(response) => match response.session {
            Some(session) => {
                tracing::info!(
                    user_id = ?response.user.as_ref().map(|u| u.id),
                    "Password sign-in succeeded"
                );
                let jar = cookies::with_session(jar, &session, state.config.session.secure_cookies);
                (jar, Redirect::to("/dashboard"))
            }
            None => {
                tracing::warn!("Password sign-in returned no session");
                (jar, error_redirect())
            }
        },
        Err(e) => {
            tracing::info!(error = %e, "Password sign-in failed");
            (jar, error_redirect())
        }
    }
}

/// `POST /auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<SignupForm>, FormRejection>,
) -> (CookieJar, Redirect) {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::info!(error = %e, "Unreadable signup form");
            return (jar, error_redirect());
        }
    };

    if let Err(e) = form.validate() {
        tracing::info!(error = %e, "Invalid signup form");
        return (jar, error_redirect());
    }

    let request = SignUpRequest {
        full_name: form.full_name(),
        email: form.email,
        password: form.password,
        email_redirect_to: confirm_url(&state.config.site_url).to_string(),
    };

    match state.identity.sign_up(&request).await {
        Ok(response) => {
            tracing::info!(
                user_id = ?response.user.as_ref().map(|u| u.id),
                confirmed = response.session.is_some(),
                "Sign-up accepted"
            );
            // Projects with auto-confirm answer with a live session.
            let jar = match response.session {
                Some(session) => {
                    cookies::with_session(jar, &session, state.config.session.secure_cookies)
                }
                None => jar,
            };
            (jar, Redirect::to("/"))
        }
        Err(e) => {
            tracing::info!(error = %e, "Sign-up failed");
            (jar, error_redirect())
        }
    }
}

/// `GET /logout`
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(token) = cookies::access_token(&jar) {
        if let Err(e) = state.identity.sign_out(&token).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
    }

    (cookies::clear_session(jar), Redirect::to("/login"))
}

/// `GET /auth/google`: start the provider's OAuth flow with a PKCE challenge.
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let verifier = pkce::generate_verifier();
    let challenge = pkce::challenge(&verifier);

    let authorize = state.identity.authorize_url(
        "google",
        confirm_url(&state.config.site_url).as_str(),
        &challenge,
    )?;

    let jar = cookies::with_code_verifier(jar, verifier, state.config.session.secure_cookies);
    Ok((jar, Redirect::to(authorize.as_str())))
}
