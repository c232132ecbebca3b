//! OpenAPI documentation for the marketplace API.
//!
//! The generated document is served through a Scalar UI at `/docs`; see
//! [`crate::build_router`].

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;
use crate::auth::session;

/// Session-cookie security scheme referenced by the authenticated paths.
struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_cookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(session::ACCESS_TOKEN_COOKIE))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::refresh,
        api::handlers::auth::get_me,
        api::handlers::auth::update_me,
        api::handlers::auth::change_password,
        api::handlers::auth::list_my_products,
        api::handlers::articles::create_article,
        api::handlers::articles::list_articles,
        api::handlers::articles::get_article,
        api::handlers::articles::update_article,
        api::handlers::articles::delete_article,
        api::handlers::articles::create_article_comment,
        api::handlers::articles::list_article_comments,
        api::handlers::articles::toggle_article_like,
        api::handlers::products::create_product,
        api::handlers::products::list_products,
        api::handlers::products::list_liked_products,
        api::handlers::products::get_product,
        api::handlers::products::update_product,
        api::handlers::products::delete_product,
        api::handlers::products::create_product_comment,
        api::handlers::products::list_product_comments,
        api::handlers::products::toggle_product_like,
        api::handlers::comments::update_comment,
        api::handlers::comments::delete_comment,
    ),
    modifiers(&SessionCookieAddon),
    tags(
        (name = "auth", description = "Registration, login and session lifecycle"),
        (name = "articles", description = "Articles, their comments and likes"),
        (name = "products", description = "Products, their comments and likes"),
        (name = "comments", description = "Comment editing and removal"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("OpenAPI document should serialize");
        assert!(json.contains("/auth/login"));
        assert!(json.contains("/articles/{id}/comments"));
        assert!(json.contains("session_cookie"));
    }
}
