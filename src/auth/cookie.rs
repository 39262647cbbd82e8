use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::token::TOKEN_TTL_DAYS;
use crate::config::ServerConfig;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Build the session cookie carrying a freshly issued token.
///
/// HTTP-only keeps the token out of reach of scripts; SameSite=Strict stops
/// cross-site sends; Secure is set in production where the service sits
/// behind TLS. Max-age matches the token's own expiry.
pub fn session_cookie(config: &ServerConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.production)
        .same_site(SameSite::Strict)
        .max_age(Duration::days(TOKEN_TTL_DAYS))
        .build()
}

/// Build the cookie that ends the session.
///
/// Attributes must match [`session_cookie`] (modulo max-age) or browsers
/// keep the original cookie alive.
pub fn clear_session_cookie(config: &ServerConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(config.production)
        .same_site(SameSite::Strict)
        .max_age(Duration::ZERO)
        .build()
}

/// Read the session token from the request's cookies, if present
pub fn extract_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string())
}
