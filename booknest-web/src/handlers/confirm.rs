//! `GET /auth/confirm`: landing point for email links and OAuth callbacks.

use axum::{
    extract::{OriginalUri, State},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use url::Url;

use crate::{
    models::AuthAttempt,
    services::AuthOutcome,
    utils::cookies,
    AppState,
};

/// Query parameters consumed by the callback and never forwarded.
pub const AUTH_PARAMS: [&str; 4] = ["code", "token_hash", "type", "next"];

const DASHBOARD_PATH: &str = "/dashboard";
const ERROR_PATH: &str = "/error";
const DEFAULT_NEXT: &str = "/";

/// Raw callback parameters, first occurrence of each key.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub token_hash: Option<String>,
    pub otp_type: Option<String>,
    pub next: Option<String>,
}

impl CallbackParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = CallbackParams::default();
        for (key, value) in url.query_pairs() {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "token_hash" => &mut params.token_hash,
                "type" => &mut params.otp_type,
                "next" => &mut params.next,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    pub fn attempt(&self) -> AuthAttempt {
        AuthAttempt::classify(
            self.code.as_deref(),
            self.token_hash.as_deref(),
            self.otp_type.as_deref(),
        )
    }

    pub fn next_path(&self) -> &str {
        self.next
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NEXT)
    }
}

fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Reconstruct the absolute URL the browser requested.
///
/// Scheme comes from `X-Forwarded-Proto` then the request target, authority
/// from `X-Forwarded-Host`, `Host`, then the request target (HTTP/2 and
/// absolute-form requests carry no `Host`). Anything missing or unusable
/// falls back to `site_url`.
pub fn inbound_url(headers: &HeaderMap, uri: &Uri, site_url: &Url) -> Url {
    fn is_web(scheme: &&str) -> bool {
        matches!(*scheme, "http" | "https")
    }

    let scheme = first_header_value(headers, "x-forwarded-proto")
        .filter(is_web)
        .or_else(|| uri.scheme_str().filter(is_web))
        .unwrap_or_else(|| site_url.scheme());

    let host = first_header_value(headers, "x-forwarded-host")
        .or_else(|| first_header_value(headers, "host"))
        .or_else(|| uri.authority().map(|a| a.as_str()));

    let mut url = host
        .and_then(|host| Url::parse(&format!("{}://{}", scheme, host)).ok())
        .filter(|u| u.username().is_empty() && u.path() == "/")
        .unwrap_or_else(|| site_url.clone());

    url.set_path(uri.path());
    url.set_query(uri.query());
    url.set_fragment(None);
    url
}

/// Same origin and foreign query parameters as `inbound`, new path.
pub fn redirect_target(inbound: &Url, path: &str) -> Url {
    let mut url = inbound.clone();
    url.set_path(path);

    let has_auth_params = url
        .query_pairs()
        .any(|(k, _)| AUTH_PARAMS.contains(&k.as_ref()));

    if has_auth_params {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !AUTH_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    url
}

pub async fn confirm(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let inbound = inbound_url(&headers, &uri, &state.config.site_url);
    let params = CallbackParams::from_url(&inbound);
    let attempt = params.attempt();

    let (verifier, jar) = match attempt {
        AuthAttempt::Code { .. } => (cookies::code_verifier(&jar), cookies::clear_code_verifier(jar)),
        _ => (None, jar),
    };

    let outcome = state.auth_flow.complete(&attempt, verifier.as_deref()).await;
    let secure = state.config.session.secure_cookies;

    let (path, jar) = match outcome {
        AuthOutcome::Dashboard { session } => (
            DASHBOARD_PATH,
            match session {
                Some(session) => cookies::with_session(jar, &session, secure),
                None => jar,
            },
        ),
        AuthOutcome::Next { session } => (
            params.next_path(),
            match session {
                Some(session) => cookies::with_session(jar, &session, secure),
                None => jar,
            },
        ),
        AuthOutcome::Error => (ERROR_PATH, jar),
    };

    let target = redirect_target(&inbound, path);
    tracing::debug!(branch = attempt.branch(), target = %target, "Auth callback redirect");

    (jar, Redirect::temporary(target.as_str()).into_response())
}
