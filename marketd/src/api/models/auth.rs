//! API request/response models for the authentication endpoints.
//!
//! Login, refresh and logout responses carry `Set-Cookie` headers for both
//! session slots; the pair is always written (or cleared) together.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::UserResponse;
use crate::errors::Error;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub nickname: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Attach both session cookies to a JSON response. The pair is one logical
/// unit; a client must never see one slot updated without the other.
fn with_session_cookies<T: Serialize>(status: StatusCode, body: Json<T>, cookies: [String; 2]) -> Response {
    let mut response = (status, body).into_response();
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                return Error::Internal {
                    operation: format!("encode session cookie: {e}"),
                }
                .into_response();
            }
        }
    }
    response
}

/// Successful login: user payload plus fresh session cookies.
pub struct LoginResponse {
    pub auth: AuthResponse,
    pub access_cookie: String,
    pub refresh_cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        with_session_cookies(StatusCode::OK, Json(self.auth), [self.access_cookie, self.refresh_cookie])
    }
}

/// Successful token refresh: both slots overwritten with a fresh pair.
pub struct RefreshResponse {
    pub access_cookie: String,
    pub refresh_cookie: String,
}

impl IntoResponse for RefreshResponse {
    fn into_response(self) -> Response {
        with_session_cookies(
            StatusCode::OK,
            Json(MessageResponse::new("Token refresh successful")),
            [self.access_cookie, self.refresh_cookie],
        )
    }
}

/// Logout clears both session slots client-side. Tokens themselves are not
/// revoked; see the token module docs.
pub struct LogoutResponse {
    pub access_cookie: String,
    pub refresh_cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        with_session_cookies(
            StatusCode::OK,
            Json(MessageResponse::new("Logout successful")),
            [self.access_cookie, self.refresh_cookie],
        )
    }
}
