//! Browser cookies carrying the provider session and the PKCE verifier.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::services::ProviderSession;

pub const ACCESS_TOKEN_COOKIE: &str = "booknest-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "booknest-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "booknest-code-verifier";

const REFRESH_TOKEN_DAYS: i64 = 30;
const CODE_VERIFIER_MINUTES: i64 = 10;

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Store the access and refresh tokens. The access cookie expires with the token.
pub fn with_session(jar: CookieJar, session: &ProviderSession, secure: bool) -> CookieJar {
    let mut access = base_cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone(), secure);
    access.set_max_age(time::Duration::seconds(session.expires_in.max(0)));

    let mut refresh = base_cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone(), secure);
    refresh.set_max_age(time::Duration::days(REFRESH_TOKEN_DAYS));

    jar.add(access).add(refresh)
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"))
}

pub fn with_code_verifier(jar: CookieJar, verifier: String, secure: bool) -> CookieJar {
    let mut cookie = base_cookie(CODE_VERIFIER_COOKIE, verifier, secure);
    cookie.set_max_age(time::Duration::minutes(CODE_VERIFIER_MINUTES));
    jar.add(cookie)
}

pub fn clear_code_verifier(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(CODE_VERIFIER_COOKIE).path("/"))
}

pub fn access_token(jar: &CookieJar) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn code_verifier(jar: &CookieJar) -> Option<String> {
    jar.get(CODE_VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
