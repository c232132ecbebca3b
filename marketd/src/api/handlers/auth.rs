use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, LoginRequest, LoginResponse, LogoutResponse, MessageResponse, RefreshResponse, RegisterRequest},
        products::{ProductListResponse, ProductResponse},
        users::{ChangePasswordRequest, UpdateMeRequest, UserResponse},
    },
    auth::{
        identity::RequireIdentity,
        password, session,
        token::TokenKind,
    },
    errors::Error,
    store::{UserCreate, UserPatch},
};

/// Validate password length against the configured bounds.
fn check_password_bounds(password: &str, state: &AppState) -> Result<(), Error> {
    let bounds = &state.config.auth.password;
    if password.len() < bounds.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", bounds.min_length),
        });
    }
    if password.len() > bounds.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", bounds.max_length),
        });
    }
    Ok(())
}

/// Hash a password on a blocking thread to avoid stalling the async runtime.
async fn hash_password_blocking(password: String) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Verify a password on a blocking thread.
async fn verify_password_blocking(password: String, hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or duplicate email/nickname"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    if request.email.is_empty() || !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    if request.nickname.is_empty() {
        return Err(Error::BadRequest {
            message: "A nickname is required".to_string(),
        });
    }
    check_password_bounds(&request.password, &state)?;

    // Friendly duplicate checks; the store's unique indexes remain the
    // authoritative guard under concurrent registration.
    if state.store.count_users_by_email(&request.email).await? > 0 {
        return Err(Error::BadRequest {
            message: "email already in use".to_string(),
        });
    }
    if state.store.count_users_by_nickname(&request.nickname).await? > 0 {
        return Err(Error::BadRequest {
            message: "nickname already in use".to_string(),
        });
    }

    let password_hash = hash_password_blocking(request.password).await?;
    let user = state
        .store
        .create_user(UserCreate {
            email: request.email,
            nickname: request.nickname,
            password_hash,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful, session cookies set", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    // Same response for unknown email and wrong password so login cannot be
    // used to probe which addresses exist.
    let invalid_credentials = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let user = state
        .store
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let is_valid = verify_password_blocking(request.password, user.password_hash.clone()).await?;
    if !is_valid {
        return Err(invalid_credentials());
    }

    let pair = state.tokens.issue_pair(user.id)?;

    Ok(LoginResponse {
        auth: AuthResponse {
            user: user.into(),
            message: "Login successful".to_string(),
        },
        access_cookie: session::access_cookie(&pair.access, &state.config.auth),
        refresh_cookie: session::refresh_cookie(&pair.refresh, &state.config.auth),
    })
}

/// Logout (clear both session slots)
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout() -> LogoutResponse {
    LogoutResponse {
        access_cookie: session::clear_access_cookie(),
        refresh_cookie: session::clear_refresh_cookie(),
    }
}

/// Mint a fresh token pair from a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Both session slots overwritten", body = MessageResponse),
        (status = 401, description = "Missing or invalid refresh token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<RefreshResponse, Error> {
    let token = session::cookie_value(&headers, session::REFRESH_TOKEN_COOKIE).ok_or(Error::Unauthenticated {
        message: Some("Missing refresh token".to_string()),
    })?;

    let subject = state.tokens.verify(&token, TokenKind::Refresh).map_err(|_| Error::Unauthenticated {
        message: Some("Invalid refresh token".to_string()),
    })?;

    let pair = state.tokens.issue_pair(subject)?;

    Ok(RefreshResponse {
        access_cookie: session::access_cookie(&pair.access, &state.config.auth),
        refresh_cookie: session::refresh_cookie(&pair.refresh, &state.config.auth),
    })
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(RequireIdentity(user): RequireIdentity) -> Json<UserResponse> {
    Json(user.into())
}

/// Update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/auth/me",
    request_body = UpdateMeRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid input or nickname already in use"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Json(request): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, Error> {
    if request.nickname.as_deref() == Some("") {
        return Err(Error::BadRequest {
            message: "Nickname must not be empty".to_string(),
        });
    }

    let updated = state
        .store
        .update_user(
            user.id,
            UserPatch {
                nickname: request.nickname,
                image: request.image,
                password_hash: None,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Change the authenticated user's password
#[utoipa::path(
    patch,
    path = "/auth/me/password",
    request_body = ChangePasswordRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 400, description = "Invalid new password"),
        (status = 401, description = "Current password is incorrect"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    let is_valid = verify_password_blocking(request.current_password, user.password_hash.clone()).await?;
    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    check_password_bounds(&request.new_password, &state)?;
    let password_hash = hash_password_blocking(request.new_password).await?;

    state
        .store
        .update_user(
            user.id,
            UserPatch {
                password_hash: Some(password_hash),
                ..UserPatch::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// List products created by the authenticated user, newest first
#[utoipa::path(
    get,
    path = "/auth/me/products",
    tag = "auth",
    responses(
        (status = 200, description = "Products owned by the current user", body = ProductListResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_my_products(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<Json<ProductListResponse>, Error> {
    let products = state.store.list_products_by_owner(user.id).await?;
    Ok(Json(ProductListResponse {
        list: products.into_iter().map(ProductResponse::from).collect(),
    }))
}
