//! Shared test fixtures: in-memory application state, a test server over
//! the full router, and registration/login helpers.

use std::sync::Arc;

use axum_test::TestServer;

use crate::{
    AppState, build_router,
    auth::{password, session::ACCESS_TOKEN_COOKIE, token::TokenService},
    config::{AuthConfig, Config},
    store::{UserCreate, UserRecord, memory::MemoryStore},
};

pub const TEST_PASSWORD: &str = "password123";

pub fn create_test_config() -> Config {
    Config {
        auth: AuthConfig {
            access_token_secret: "test-access-secret".to_string(),
            refresh_token_secret: "test-refresh-secret".to_string(),
            ..AuthConfig::default()
        },
        ..Config::default()
    }
}

pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let tokens = TokenService::from_config(&config.auth);
    AppState::builder()
        .store(Arc::new(MemoryStore::new()))
        .config(config)
        .tokens(tokens)
        .build()
}

pub fn create_test_server() -> (TestServer, AppState) {
    let state = create_test_state();
    let router = build_router(state.clone()).expect("failed to build router");
    let server = TestServer::new(router).expect("failed to create test server");
    (server, state)
}

pub fn register_request(email: &str, nickname: &str) -> serde_json::Value {
    serde_json::json!({ "email": email, "nickname": nickname, "password": TEST_PASSWORD })
}

/// Insert a user directly into the store, bypassing the HTTP surface.
pub async fn create_test_user(state: &AppState, email: &str, nickname: &str) -> UserRecord {
    let password_hash = password::hash_password(TEST_PASSWORD).unwrap();
    state
        .store
        .create_user(UserCreate {
            email: email.to_string(),
            nickname: nickname.to_string(),
            password_hash,
        })
        .await
        .unwrap()
}

/// Log in over HTTP and return a `Cookie` header value for the session.
pub async fn login_cookie(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&serde_json::json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status(axum::http::StatusCode::OK);
    format!("{ACCESS_TOKEN_COOKIE}={}", response.cookie(ACCESS_TOKEN_COOKIE).value())
}

pub async fn register_and_login(server: &TestServer, email: &str, nickname: &str) -> String {
    let response = server.post("/auth/register").json(&register_request(email, nickname)).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    login_cookie(server, email).await
}
