//! JWT token issuance and verification.
//!
//! Two token kinds exist: short-lived *access* tokens presented on every
//! authenticated request, and long-lived *refresh* tokens presented only to
//! `/auth/refresh` to mint a new pair. Each kind is signed with its own
//! secret, so a refresh token can never pass as an access token.
//!
//! Refresh tokens are deliberately not rotated or revoked on use or on
//! logout: re-presenting the same refresh token before its expiry always
//! succeeds, and logout only clears the client's cookie slots. A stolen
//! refresh token therefore stays valid for its full TTL; see DESIGN.md for
//! the reasoning behind keeping that behavior.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::errors::Error;
use crate::types::UserId;

/// Which secret and TTL a token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Verification failures. Internal to the token service; callers translate
/// both variants to `Unauthenticated` at the boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: UserId,
    iat: i64,
    exp: i64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies both token kinds. Pure computation; no I/O.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn issue(&self, subject: UserId, kind: TokenKind) -> Result<String, Error> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl(kind)).map_err(|e| Error::Internal {
            operation: format!("token TTL out of range: {e}"),
        })?;
        let claims = Claims {
            sub: subject,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let key = EncodingKey::from_secret(self.secret(kind).as_bytes());
        encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
            operation: format!("sign token: {e}"),
        })
    }

    /// Issue a new access/refresh pair for `subject`.
    pub fn issue_pair(&self, subject: UserId) -> Result<TokenPair, Error> {
        Ok(TokenPair {
            access: self.issue(subject, TokenKind::Access)?,
            refresh: self.issue(subject, TokenKind::Refresh)?,
        })
    }

    /// Verify `token` under the secret of `kind` and return its subject.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<UserId, TokenError> {
        let key = DecodingKey::from_secret(self.secret(kind).as_bytes());
        let validation = Validation::default();

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_service() -> TokenService {
        TokenService {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = test_service();
        let subject = Uuid::new_v4();

        let pair = service.issue_pair(subject).unwrap();
        assert_eq!(service.verify(&pair.access, TokenKind::Access).unwrap(), subject);
        assert_eq!(service.verify(&pair.refresh, TokenKind::Refresh).unwrap(), subject);
    }

    #[test]
    fn test_cross_kind_rejection() {
        let service = test_service();
        let pair = service.issue_pair(Uuid::new_v4()).unwrap();

        assert_eq!(
            service.verify(&pair.refresh, TokenKind::Access).unwrap_err(),
            TokenError::Invalid
        );
        assert_eq!(
            service.verify(&pair.access, TokenKind::Refresh).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_expired_token() {
        let service = test_service();
        let subject = Uuid::new_v4();

        // Hand-craft a token whose exp is well past the default leeway.
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            iat: (now - chrono::Duration::hours(2)).timestamp(),
            exp: (now - chrono::Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_secret(service.access_secret.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        assert_eq!(
            service.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let service = test_service();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            assert_eq!(
                service.verify(token, TokenKind::Access).unwrap_err(),
                TokenError::Invalid,
                "expected Invalid for token: {token}"
            );
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let pair = service.issue_pair(Uuid::new_v4()).unwrap();

        let other = TokenService {
            access_secret: "different-secret".to_string(),
            ..test_service()
        };
        assert_eq!(
            other.verify(&pair.access, TokenKind::Access).unwrap_err(),
            TokenError::Invalid
        );
    }
}
