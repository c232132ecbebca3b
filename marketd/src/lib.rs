//! # marketd: a marketplace backend
//!
//! `marketd` exposes CRUD and social-interaction endpoints for a small
//! marketplace - articles, products, comments and likes - behind a
//! token-based session layer.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer. Persistence goes through the [`store`] trait contract,
//! with an in-memory implementation for development and tests and a
//! PostgreSQL adapter (sqlx) for production.
//!
//! ### Request flow
//!
//! Every request first passes through the session layer: the
//! [`auth::identity`] extractors read the access-token cookie, verify it
//! against the access secret, and resolve the subject against the user
//! store. Handlers receive the resolved identity as a value. Mutations on
//! owned resources (articles, products, comments) are conditional store
//! operations - update/delete-where-owner-matches - so the ownership check
//! and the mutation are a single atomic step; [`authz`] translates the
//! outcome into 403/404.
//!
//! Two data-access patterns do the interesting work:
//!
//! - **Keyset cursor pagination** over comments ([`api::models::pagination`]):
//!   pages are fetched with a `limit + 1` probe ordered by
//!   `(created_at, id)` descending, so page cost is independent of depth
//!   and no row is duplicated or skipped across pages.
//! - **Idempotent like toggling** ([`likes`]): the (user, target) relation
//!   is flipped via delete-first/insert-on-conflict, so concurrent toggles
//!   converge instead of erroring.
//!
//! ### Sessions
//!
//! Login issues a short-lived access JWT and a long-lived refresh JWT,
//! signed with distinct secrets, and stores them in two HTTP-only cookies.
//! The refresh cookie is path-scoped to `/auth/refresh`. See
//! [`auth::token`] for the (deliberate) non-rotation semantics.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use marketd::{Application, config::{Args, Config}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     marketd::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod errors;
pub mod likes;
mod openapi;
pub mod store;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::auth::token::TokenService;
use crate::config::{Config, DatabaseConfig};
use crate::store::{DynStore, memory::MemoryStore, postgres::PostgresStore};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: DynStore,
    pub config: Config,
    pub tokens: TokenService,
}

/// Create CORS layer from configuration; `None` when no origins are allowed
/// (same-origin deployments need no layer).
fn create_cors_layer(config: &Config) -> anyhow::Result<Option<CorsLayer>> {
    if config.cors.allowed_origins.is_empty() {
        return Ok(None);
    }

    let mut origins = Vec::with_capacity(config.cors.allowed_origins.len());
    for origin in &config.cors.allowed_origins {
        let header_value = origin
            .parse::<HeaderValue>()
            .map_err(|e| anyhow::anyhow!("invalid CORS origin {origin}: {e}"))?;
        origins.push(header_value);
    }

    // Session cookies require credentials, which rules out wildcard origins.
    Ok(Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    ))
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/logout", post(api::handlers::auth::logout))
        .route("/auth/refresh", post(api::handlers::auth::refresh))
        .route("/auth/me", get(api::handlers::auth::get_me).patch(api::handlers::auth::update_me))
        .route("/auth/me/password", patch(api::handlers::auth::change_password))
        .route("/auth/me/products", get(api::handlers::auth::list_my_products));

    let article_routes = Router::new()
        .route(
            "/articles",
            post(api::handlers::articles::create_article).get(api::handlers::articles::list_articles),
        )
        .route(
            "/articles/{id}",
            get(api::handlers::articles::get_article)
                .patch(api::handlers::articles::update_article)
                .delete(api::handlers::articles::delete_article),
        )
        .route(
            "/articles/{id}/comments",
            post(api::handlers::articles::create_article_comment).get(api::handlers::articles::list_article_comments),
        )
        .route("/articles/{id}/likes", post(api::handlers::articles::toggle_article_like));

    let product_routes = Router::new()
        .route(
            "/products",
            post(api::handlers::products::create_product).get(api::handlers::products::list_products),
        )
        .route("/products/liked", get(api::handlers::products::list_liked_products))
        .route(
            "/products/{id}",
            get(api::handlers::products::get_product)
                .patch(api::handlers::products::update_product)
                .delete(api::handlers::products::delete_product),
        )
        .route(
            "/products/{id}/comments",
            post(api::handlers::products::create_product_comment).get(api::handlers::products::list_product_comments),
        )
        .route("/products/{id}/likes", post(api::handlers::products::toggle_product_like));

    let comment_routes = Router::new().route(
        "/comments/{id}",
        patch(api::handlers::comments::update_comment).delete(api::handlers::comments::delete_comment),
    );

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .merge(article_routes)
        .merge(product_routes)
        .merge(comment_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()));

    if let Some(cors_layer) = create_cors_layer(&state.config)? {
        router = router.layer(cors_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects the configured store (running
///    migrations for PostgreSQL) and builds the router.
/// 2. **Serve**: [`Application::serve`] binds the TCP listener and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: DynStore = match &config.database {
            DatabaseConfig::Memory => {
                info!("Using in-memory store; data will not survive restarts");
                Arc::new(MemoryStore::new())
            }
            DatabaseConfig::Postgres { url } => {
                info!("Using external PostgreSQL store");
                Arc::new(PostgresStore::connect(url).await?)
            }
        };

        let tokens = TokenService::from_config(&config.auth);
        let state = AppState::builder().store(store).config(config.clone()).tokens(tokens).build();
        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("marketd listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;

    use crate::api::models::articles::ArticleResponse;
    use crate::test_utils::{create_test_server, register_and_login};

    #[tokio::test]
    async fn test_healthz() {
        let (server, _state) = create_test_server();
        let response = server.get("/healthz").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.text(), "OK");
    }

    /// The full ownership scenario: two users, one article, every mutation
    /// gated on the creator.
    #[tokio::test]
    async fn test_end_to_end_ownership_flow() {
        let (server, _state) = create_test_server();

        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let response = server
            .post("/articles")
            .add_header("cookie", alice.clone())
            .json(&serde_json::json!({ "title": "article 1", "content": "by alice" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let article: ArticleResponse = response.json();

        let bob = register_and_login(&server, "b@x.com", "bob").await;

        // Bob cannot touch Alice's article.
        server
            .patch(&format!("/articles/{}", article.id))
            .add_header("cookie", bob.clone())
            .json(&serde_json::json!({ "title": "bob's now" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Alice can edit it.
        server
            .patch(&format!("/articles/{}", article.id))
            .add_header("cookie", alice.clone())
            .json(&serde_json::json!({ "title": "article 1 (edited)" }))
            .await
            .assert_status(StatusCode::OK);

        // Bob cannot delete it; Alice can.
        server
            .delete(&format!("/articles/{}", article.id))
            .add_header("cookie", bob)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&format!("/articles/{}", article.id))
            .add_header("cookie", alice)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        // Gone for everyone.
        server
            .get(&format!("/articles/{}", article.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
