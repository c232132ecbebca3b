//! Session cookie slots.
//!
//! Two HTTP-only cookies carry the token pair: the access slot is sent on
//! every request, the refresh slot is path-scoped to `/auth/refresh` so the
//! long-lived credential never rides along on ordinary requests. Login and
//! refresh overwrite both slots together; logout expires both.

use axum::http::HeaderMap;

use crate::config::AuthConfig;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

fn secure_suffix(config: &AuthConfig) -> &'static str {
    if config.cookie_secure { "; Secure" } else { "" }
}

/// Build the access-token `Set-Cookie` value.
pub fn access_cookie(token: &str, config: &AuthConfig) -> String {
    format!(
        "{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        config.access_token_ttl.as_secs(),
        secure_suffix(config),
    )
}

/// Build the refresh-token `Set-Cookie` value, scoped to the refresh path.
pub fn refresh_cookie(token: &str, config: &AuthConfig) -> String {
    format!(
        "{REFRESH_TOKEN_COOKIE}={token}; Path={REFRESH_COOKIE_PATH}; HttpOnly; SameSite=Lax; Max-Age={}{}",
        config.refresh_token_ttl.as_secs(),
        secure_suffix(config),
    )
}

/// Expired cookie that clears the access slot.
pub fn clear_access_cookie() -> String {
    format!("{ACCESS_TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Expired cookie that clears the refresh slot. Path must match the one the
/// cookie was set with or browsers keep the original.
pub fn clear_refresh_cookie() -> String {
    format!("{REFRESH_TOKEN_COOKIE}=; Path={REFRESH_COOKIE_PATH}; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extract a cookie value from the request's `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        if let Some((cookie_name, value)) = cookie.trim().split_once('=') {
            if cookie_name == name {
                return Some(value.to_string());
            }
        }
    }
    None
}
