//! Session middleware: per-request identity extraction.
//!
//! The session layer is expressed as two axum extractors rather than a
//! middleware with a runtime `optional` flag:
//!
//! - [`RequireIdentity`]: rejects the request with 401 unless a valid
//!   access token resolves to an existing user.
//! - [`OptionalIdentity`]: same verification chain, but every failure
//!   degrades to "anonymous" instead of an error.
//!
//! This is the single authentication chokepoint; handlers never re-verify
//! tokens themselves. The resolved identity is threaded through the call
//! chain as a value, never stashed in shared mutable state.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    auth::{session, token::TokenKind},
    errors::Error,
    store::UserRecord,
};

/// Authenticated identity; extraction fails with `Unauthenticated` when the
/// access slot is missing, the token does not verify, or the subject no
/// longer exists.
#[derive(Debug)]
pub struct RequireIdentity(pub UserRecord);

/// Identity if present and valid, `None` otherwise. Used by read endpoints
/// that personalize their response (e.g. `is_liked`) but stay public.
pub struct OptionalIdentity(pub Option<UserRecord>);

/// Shared verification chain: cookie -> token -> subject lookup.
async fn resolve_identity(parts: &Parts, state: &AppState) -> Result<UserRecord, Error> {
    let token = session::cookie_value(&parts.headers, session::ACCESS_TOKEN_COOKIE)
        .ok_or(Error::Unauthenticated { message: None })?;

    let subject = state
        .tokens
        .verify(&token, TokenKind::Access)
        .map_err(|e| {
            trace!("access token rejected: {e}");
            Error::Unauthenticated { message: None }
        })?;

    // The token may outlive its subject; a deleted user must not
    // authenticate with a stale-but-unexpired token.
    state
        .store
        .find_user_by_id(subject)
        .await?
        .ok_or(Error::Unauthenticated { message: None })
}

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        resolve_identity(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        match resolve_identity(parts, state).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(Error::Unauthenticated { .. }) => Ok(Self(None)),
            // Store failures are real errors even in optional mode.
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, create_test_user};
    use axum::http::StatusCode;

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_missing_cookie_required_mode() {
        let state = create_test_state();
        let mut parts = parts_with_cookie(None);

        let err = RequireIdentity::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_cookie_optional_mode() {
        let state = create_test_state();
        let mut parts = parts_with_cookie(None);

        let OptionalIdentity(identity) = OptionalIdentity::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let state = create_test_state();
        let user = create_test_user(&state, "a@x.com", "a").await;
        let pair = state.tokens.issue_pair(user.id).unwrap();
        let cookie = format!("access_token={}", pair.access);
        let mut parts = parts_with_cookie(Some(&cookie));

        let RequireIdentity(resolved) = RequireIdentity::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_access() {
        let state = create_test_state();
        let user = create_test_user(&state, "a@x.com", "a").await;
        let pair = state.tokens.issue_pair(user.id).unwrap();
        let cookie = format!("access_token={}", pair.refresh);
        let mut parts = parts_with_cookie(Some(&cookie));

        let err = RequireIdentity::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let state = create_test_state();
        // Token for a user that was never created.
        let pair = state.tokens.issue_pair(uuid::Uuid::new_v4()).unwrap();
        let cookie = format!("access_token={}", pair.access);

        let mut parts = parts_with_cookie(Some(&cookie));
        let err = RequireIdentity::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        // Optional mode degrades to anonymous instead.
        let mut parts = parts_with_cookie(Some(&cookie));
        let OptionalIdentity(identity) = OptionalIdentity::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(identity.is_none());
    }
}
