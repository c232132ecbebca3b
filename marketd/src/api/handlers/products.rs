use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState, authz, likes,
    api::models::{
        articles::ListParams,
        comments::{CommentCreateRequest, CommentResponse},
        likes::LikeStatusResponse,
        pagination::{CursorPage, CursorPagination, PaginatedList, split_cursor_page},
        products::{
            ProductCreateRequest, ProductDetailResponse, ProductListResponse, ProductResponse, ProductUpdateRequest,
        },
    },
    auth::identity::{OptionalIdentity, RequireIdentity},
    errors::Error,
    store::{CommentCreate, CommentParent, LikeTarget, ProductCreate, ProductPatch, StoreError},
    types::ProductId,
};

/// Create a product owned by the authenticated user
#[utoipa::path(
    post,
    path = "/products",
    request_body = ProductCreateRequest,
    tag = "products",
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Json(request): Json<ProductCreateRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), Error> {
    if request.name.is_empty() {
        return Err(Error::BadRequest {
            message: "Name must not be empty".to_string(),
        });
    }
    if request.price < 0 {
        return Err(Error::BadRequest {
            message: "Price must not be negative".to_string(),
        });
    }

    let product = state
        .store
        .create_product(ProductCreate {
            name: request.name,
            description: request.description,
            price: request.price,
            tags: request.tags,
            images: request.images,
            user_id: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// List products with offset pagination and optional keyword filter
#[utoipa::path(
    get,
    path = "/products",
    params(ListParams),
    tag = "products",
    responses(
        (status = 200, description = "Page of products", body = PaginatedList<ProductResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedList<ProductResponse>>, Error> {
    let query = params.to_query();
    let total_count = state.store.count_products(query.keyword.as_deref()).await?;
    let products = state.store.list_products(&query).await?;

    Ok(Json(PaginatedList {
        list: products.into_iter().map(ProductResponse::from).collect(),
        total_count,
    }))
}

/// List products the authenticated user has liked, most recent like first
#[utoipa::path(
    get,
    path = "/products/liked",
    tag = "products",
    responses(
        (status = 200, description = "Liked products", body = ProductListResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_liked_products(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<Json<ProductListResponse>, Error> {
    let products = state.store.list_products_liked_by(user.id).await?;
    Ok(Json(ProductListResponse {
        list: products.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// Get a single product; `is_liked` reflects the caller's like state when a
/// session is present
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    tag = "products",
    responses(
        (status = 200, description = "Product", body = ProductDetailResponse),
        (status = 404, description = "Product not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_product(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetailResponse>, Error> {
    let product = state
        .store
        .find_product_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("product", id))?;

    let is_liked = match identity {
        Some(user) => state.store.like_exists(user.id, LikeTarget::Product(id)).await?,
        None => false,
    };

    Ok(Json(ProductDetailResponse {
        product: product.into(),
        is_liked,
    }))
}

/// Update a product; only its creator may do so
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = ProductUpdateRequest,
    tag = "products",
    responses(
        (status = 200, description = "Updated product", body = ProductResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_product(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ProductId>,
    Json(request): Json<ProductUpdateRequest>,
) -> Result<Json<ProductResponse>, Error> {
    if request.name.as_deref() == Some("") {
        return Err(Error::BadRequest {
            message: "Name must not be empty".to_string(),
        });
    }
    if request.price.is_some_and(|price| price < 0) {
        return Err(Error::BadRequest {
            message: "Price must not be negative".to_string(),
        });
    }

    let outcome = state
        .store
        .update_product_owned(
            id,
            user.id,
            ProductPatch {
                name: request.name,
                description: request.description,
                price: request.price,
                tags: request.tags,
                images: request.images,
            },
        )
        .await?;

    let product = authz::resolve(outcome, "product", id, "update this product")?;
    Ok(Json(product.into()))
}

/// Delete a product; only its creator may do so
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    tag = "products",
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, Error> {
    let outcome = state.store.delete_product_owned(id, user.id).await?;
    authz::resolve(outcome, "product", id, "delete this product")?;
    Ok(StatusCode::NO_CONTENT)
}

/// Comment on a product
#[utoipa::path(
    post,
    path = "/products/{id}/comments",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = CommentCreateRequest,
    tag = "products",
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_product_comment(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ProductId>,
    Json(request): Json<CommentCreateRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), Error> {
    if request.content.is_empty() {
        return Err(Error::BadRequest {
            message: "Content must not be empty".to_string(),
        });
    }
    state
        .store
        .find_product_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("product", id))?;

    let comment = state
        .store
        .create_comment(CommentCreate {
            content: request.content,
            user_id: user.id,
            parent: CommentParent::Product(id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// List a product's comments, newest first, with cursor pagination
#[utoipa::path(
    get,
    path = "/products/{id}/comments",
    params(("id" = Uuid, Path, description = "Product id"), CursorPagination),
    tag = "products",
    responses(
        (status = 200, description = "Page of comments", body = CursorPage<CommentResponse>),
        (status = 400, description = "Unknown cursor"),
        (status = 404, description = "Product not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_product_comments(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(pagination): Query<CursorPagination>,
) -> Result<Json<CursorPage<CommentResponse>>, Error> {
    state
        .store
        .find_product_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("product", id))?;

    let limit = pagination.limit();
    let rows = state
        .store
        .page_comments(CommentParent::Product(id), pagination.cursor, limit + 1)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => Error::BadRequest {
                message: "Unknown cursor".to_string(),
            },
            other => other.into(),
        })?;

    let (rows, next_cursor) = split_cursor_page(rows, limit, |c| c.id);
    Ok(Json(CursorPage {
        list: rows.into_iter().map(CommentResponse::from).collect(),
        next_cursor,
    }))
}

/// Toggle the caller's like on a product
#[utoipa::path(
    post,
    path = "/products/{id}/likes",
    params(("id" = Uuid, Path, description = "Product id")),
    tag = "products",
    responses(
        (status = 200, description = "Like removed", body = LikeStatusResponse),
        (status = 201, description = "Like created", body = LikeStatusResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn toggle_product_like(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ProductId>,
) -> Result<(StatusCode, Json<LikeStatusResponse>), Error> {
    state
        .store
        .find_product_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("product", id))?;

    let is_liked = likes::toggle(&state.store, user.id, LikeTarget::Product(id)).await?;
    let status = if is_liked { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(LikeStatusResponse { is_liked })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_server, register_and_login};

    async fn create_product_via_api(server: &axum_test::TestServer, cookie: &str, name: &str, price: i64) -> ProductResponse {
        let response = server
            .post("/products")
            .add_header("cookie", cookie.to_string())
            .json(&serde_json::json!({
                "name": name,
                "description": "a fine item",
                "price": price,
                "tags": ["used"],
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_create_and_get_product() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let product = create_product_via_api(&server, &alice, "lamp", 1500).await;
        assert_eq!(product.tags, vec!["used"]);
        assert!(product.images.is_empty());

        let detail: ProductDetailResponse = server.get(&format!("/products/{}", product.id)).await.json();
        assert_eq!(detail.product.name, "lamp");
        assert_eq!(detail.product.price, 1500);
        assert!(!detail.is_liked);
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;

        let response = server
            .post("/products")
            .add_header("cookie", alice.clone())
            .json(&serde_json::json!({ "name": "lamp", "description": "d", "price": -1 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let product = create_product_via_api(&server, &alice, "lamp", 10).await;
        let response = server
            .patch(&format!("/products/{}", product.id))
            .add_header("cookie", alice)
            .json(&serde_json::json!({ "price": -5 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ownership_gate() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let product = create_product_via_api(&server, &alice, "lamp", 10).await;
        let bob = register_and_login(&server, "b@x.com", "bob").await;

        let response = server
            .patch(&format!("/products/{}", product.id))
            .add_header("cookie", bob.clone())
            .json(&serde_json::json!({ "name": "mine now" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .delete(&format!("/products/{}", product.id))
            .add_header("cookie", bob)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .patch(&format!("/products/{}", product.id))
            .add_header("cookie", alice.clone())
            .json(&serde_json::json!({ "name": "renamed", "price": 20 }))
            .await;
        response.assert_status(StatusCode::OK);
        let updated: ProductResponse = response.json();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.price, 20);

        let response = server
            .delete(&format!("/products/{}", product.id))
            .add_header("cookie", alice)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_liked_products_listing() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let first = create_product_via_api(&server, &alice, "first", 1).await;
        let second = create_product_via_api(&server, &alice, "second", 2).await;
        let _third = create_product_via_api(&server, &alice, "third", 3).await;

        server
            .post(&format!("/products/{}/likes", first.id))
            .add_header("cookie", alice.clone())
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&format!("/products/{}/likes", second.id))
            .add_header("cookie", alice.clone())
            .await
            .assert_status(StatusCode::CREATED);

        // Most recently liked first.
        let liked: ProductListResponse = server
            .get("/products/liked")
            .add_header("cookie", alice.clone())
            .await
            .json();
        let names: Vec<&str> = liked.list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);

        // Unliking removes it from the listing.
        server
            .post(&format!("/products/{}/likes", second.id))
            .add_header("cookie", alice.clone())
            .await
            .assert_status(StatusCode::OK);
        let liked: ProductListResponse = server.get("/products/liked").add_header("cookie", alice).await.json();
        let names: Vec<&str> = liked.list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["first"]);
    }

    #[tokio::test]
    async fn test_product_comments_pagination() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let product = create_product_via_api(&server, &alice, "discussed", 10).await;

        for i in 0..5 {
            server
                .post(&format!("/products/{}/comments", product.id))
                .add_header("cookie", alice.clone())
                .json(&serde_json::json!({ "content": format!("comment {i}") }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let page: CursorPage<CommentResponse> = server
            .get(&format!("/products/{}/comments?limit=3", product.id))
            .await
            .json();
        assert_eq!(page.list.len(), 3);
        assert_eq!(page.list[0].content, "comment 4");
        let cursor = page.next_cursor.expect("expected a next cursor");

        let page: CursorPage<CommentResponse> = server
            .get(&format!("/products/{}/comments?limit=3&cursor={cursor}", product.id))
            .await
            .json();
        assert_eq!(page.list.len(), 2);
        assert!(page.next_cursor.is_none());
        assert_eq!(page.list[1].content, "comment 0");
    }

    #[tokio::test]
    async fn test_keyword_matches_name_or_description() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;

        server
            .post("/products")
            .add_header("cookie", alice.clone())
            .json(&serde_json::json!({ "name": "desk lamp", "description": "warm light", "price": 1 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/products")
            .add_header("cookie", alice.clone())
            .json(&serde_json::json!({ "name": "chair", "description": "lamp not included", "price": 1 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/products")
            .add_header("cookie", alice)
            .json(&serde_json::json!({ "name": "table", "description": "wooden", "price": 1 }))
            .await
            .assert_status(StatusCode::CREATED);

        let page: PaginatedList<ProductResponse> = server.get("/products?keyword=lamp").await.json();
        assert_eq!(page.total_count, 2);
    }
}
