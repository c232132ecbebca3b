use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState, authz, likes,
    api::models::{
        articles::{ArticleCreateRequest, ArticleDetailResponse, ArticleResponse, ArticleUpdateRequest, ListParams},
        comments::{CommentCreateRequest, CommentResponse},
        likes::LikeStatusResponse,
        pagination::{CursorPage, CursorPagination, PaginatedList, split_cursor_page},
    },
    auth::identity::{OptionalIdentity, RequireIdentity},
    errors::Error,
    store::{ArticleCreate, ArticlePatch, CommentCreate, CommentParent, LikeTarget, StoreError},
    types::ArticleId,
};

/// Create an article owned by the authenticated user
#[utoipa::path(
    post,
    path = "/articles",
    request_body = ArticleCreateRequest,
    tag = "articles",
    responses(
        (status = 201, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_article(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Json(request): Json<ArticleCreateRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>), Error> {
    if request.title.is_empty() {
        return Err(Error::BadRequest {
            message: "Title must not be empty".to_string(),
        });
    }

    let article = state
        .store
        .create_article(ArticleCreate {
            title: request.title,
            content: request.content,
            user_id: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(article.into())))
}

/// List articles with offset pagination and optional keyword filter
#[utoipa::path(
    get,
    path = "/articles",
    params(ListParams),
    tag = "articles",
    responses(
        (status = 200, description = "Page of articles", body = PaginatedList<ArticleResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedList<ArticleResponse>>, Error> {
    let query = params.to_query();
    let total_count = state.store.count_articles(query.keyword.as_deref()).await?;
    let articles = state.store.list_articles(&query).await?;

    Ok(Json(PaginatedList {
        list: articles.into_iter().map(ArticleResponse::from).collect(),
        total_count,
    }))
}

/// Get a single article; `is_liked` reflects the caller's like state when a
/// session is present
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article id")),
    tag = "articles",
    responses(
        (status = 200, description = "Article", body = ArticleDetailResponse),
        (status = 404, description = "Article not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_article(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
    Path(id): Path<ArticleId>,
) -> Result<Json<ArticleDetailResponse>, Error> {
    let article = state
        .store
        .find_article_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("article", id))?;

    let is_liked = match identity {
        Some(user) => state.store.like_exists(user.id, LikeTarget::Article(id)).await?,
        None => false,
    };

    Ok(Json(ArticleDetailResponse {
        article: article.into(),
        is_liked,
    }))
}

/// Update an article; only its creator may do so
#[utoipa::path(
    patch,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article id")),
    request_body = ArticleUpdateRequest,
    tag = "articles",
    responses(
        (status = 200, description = "Updated article", body = ArticleResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Article not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_article(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ArticleId>,
    Json(request): Json<ArticleUpdateRequest>,
) -> Result<Json<ArticleResponse>, Error> {
    if request.title.as_deref() == Some("") {
        return Err(Error::BadRequest {
            message: "Title must not be empty".to_string(),
        });
    }

    let outcome = state
        .store
        .update_article_owned(
            id,
            user.id,
            ArticlePatch {
                title: request.title,
                content: request.content,
            },
        )
        .await?;

    let article = authz::resolve(outcome, "article", id, "update this article")?;
    Ok(Json(article.into()))
}

/// Delete an article; only its creator may do so
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article id")),
    tag = "articles",
    responses(
        (status = 204, description = "Article deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Article not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_article(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ArticleId>,
) -> Result<StatusCode, Error> {
    let outcome = state.store.delete_article_owned(id, user.id).await?;
    authz::resolve(outcome, "article", id, "delete this article")?;
    Ok(StatusCode::NO_CONTENT)
}

/// Comment on an article
#[utoipa::path(
    post,
    path = "/articles/{id}/comments",
    params(("id" = Uuid, Path, description = "Article id")),
    request_body = CommentCreateRequest,
    tag = "articles",
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Article not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_article_comment(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ArticleId>,
    Json(request): Json<CommentCreateRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), Error> {
    if request.content.is_empty() {
        return Err(Error::BadRequest {
            message: "Content must not be empty".to_string(),
        });
    }
    state
        .store
        .find_article_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("article", id))?;

    let comment = state
        .store
        .create_comment(CommentCreate {
            content: request.content,
            user_id: user.id,
            parent: CommentParent::Article(id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// List an article's comments, newest first, with cursor pagination
#[utoipa::path(
    get,
    path = "/articles/{id}/comments",
    params(("id" = Uuid, Path, description = "Article id"), CursorPagination),
    tag = "articles",
    responses(
        (status = 200, description = "Page of comments", body = CursorPage<CommentResponse>),
        (status = 400, description = "Unknown cursor"),
        (status = 404, description = "Article not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_article_comments(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    Query(pagination): Query<CursorPagination>,
) -> Result<Json<CursorPage<CommentResponse>>, Error> {
    state
        .store
        .find_article_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("article", id))?;

    let limit = pagination.limit();
    // Probe one row past the limit to learn whether a next page exists.
    let rows = state
        .store
        .page_comments(CommentParent::Article(id), pagination.cursor, limit + 1)
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

/// Toggle the caller's like on an article
#[utoipa::path(
    post,
    path = "/articles/{id}/likes",
    params(("id" = Uuid, Path, description = "Article id")),
    tag = "articles",
    responses(
        (status = 200, description = "Like removed", body = LikeStatusResponse),
        (status = 201, description = "Like created", body = LikeStatusResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Article not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn toggle_article_like(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<ArticleId>,
) -> Result<(StatusCode, Json<LikeStatusResponse>), Error> {
    state
        .store
        .find_article_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("article", id))?;

    let is_liked = likes::toggle(&state.store, user.id, LikeTarget::Article(id)).await?;
    let status = if is_liked { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(LikeStatusResponse { is_liked })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_server, login_cookie, register_and_login, register_request};

    async fn create_article_via_api(server: &axum_test::TestServer, cookie: &str, title: &str) -> ArticleResponse {
        let response = server
            .post("/articles")
            .add_header("cookie", cookie.to_string())
            .json(&serde_json::json!({ "title": title, "content": "some content" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let (server, _state) = create_test_server();

        let response = server
            .post("/articles")
            .json(&serde_json::json!({ "title": "t", "content": "c" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ownership_gate_on_update_and_delete() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let article = create_article_via_api(&server, &alice, "alice's article").await;
        let bob = register_and_login(&server, "b@x.com", "bob").await;

        // Another identity: 403 on update and delete.
        let response = server
            .patch(&format!("/articles/{}", article.id))
            .add_header("cookie", bob.clone())
            .json(&serde_json::json!({ "title": "stolen" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .delete(&format!("/articles/{}", article.id))
            .add_header("cookie", bob)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // The creator: 200, then 204.
        let response = server
            .patch(&format!("/articles/{}", article.id))
            .add_header("cookie", alice.clone())
            .json(&serde_json::json!({ "title": "edited" }))
            .await;
        response.assert_status(StatusCode::OK);
        let updated: ArticleResponse = response.json();
        assert_eq!(updated.title, "edited");
        assert_eq!(updated.content, "some content");

        let response = server
            .delete(&format!("/articles/{}", article.id))
            .add_header("cookie", alice)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server.get(&format!("/articles/{}", article.id)).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mutating_missing_article_is_not_found_for_everyone() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;

        let response = server
            .patch(&format!("/articles/{}", uuid::Uuid::new_v4()))
            .add_header("cookie", alice)
            .json(&serde_json::json!({ "title": "x" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_with_keyword_and_order() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        create_article_via_api(&server, &alice, "first post").await;
        create_article_via_api(&server, &alice, "second post").await;
        create_article_via_api(&server, &alice, "unrelated").await;

        let response = server.get("/articles?keyword=post&order=oldest").await;
        response.assert_status(StatusCode::OK);
        let page: PaginatedList<ArticleResponse> = response.json();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.list[0].title, "first post");
        assert_eq!(page.list[1].title, "second post");

        let response = server.get("/articles?page_size=2").await;
        let page: PaginatedList<ArticleResponse> = response.json();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.list.len(), 2);
        assert_eq!(page.list[0].title, "unrelated");
    }

    #[tokio::test]
    async fn test_detail_is_liked_personalization() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let article = create_article_via_api(&server, &alice, "likeable").await;

        let response = server
            .post(&format!("/articles/{}/likes", article.id))
            .add_header("cookie", alice.clone())
            .await;
        response.assert_status(StatusCode::CREATED);

        // Anonymous readers see is_liked: false, the liker sees true.
        let detail: ArticleDetailResponse = server.get(&format!("/articles/{}", article.id)).await.json();
        assert!(!detail.is_liked);

        let detail: ArticleDetailResponse = server
            .get(&format!("/articles/{}", article.id))
            .add_header("cookie", alice)
            .await
            .json();
        assert!(detail.is_liked);
    }

    #[tokio::test]
    async fn test_like_toggle_involution_over_http() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let article = create_article_via_api(&server, &alice, "likeable").await;
        let path = format!("/articles/{}/likes", article.id);

        let response = server.post(&path).add_header("cookie", alice.clone()).await;
        response.assert_status(StatusCode::CREATED);
        assert!(response.json::<LikeStatusResponse>().is_liked);

        let response = server.post(&path).add_header("cookie", alice.clone()).await;
        response.assert_status(StatusCode::OK);
        assert!(!response.json::<LikeStatusResponse>().is_liked);

        let response = server.post(&path).add_header("cookie", alice).await;
        response.assert_status(StatusCode::CREATED);
        assert!(response.json::<LikeStatusResponse>().is_liked);
    }

    #[tokio::test]
    async fn test_like_missing_article_is_not_found() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;

        let response = server
            .post(&format!("/articles/{}/likes", uuid::Uuid::new_v4()))
            .add_header("cookie", alice)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comment_cursor_pagination_walks_every_comment_once() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let article = create_article_via_api(&server, &alice, "discussed").await;

        for i in 0..25 {
            let response = server
                .post(&format!("/articles/{}/comments", article.id))
                .add_header("cookie", alice.clone())
                .json(&serde_json::json!({ "content": format!("comment {i}") }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        // First page: 10 items, newest first, with a cursor.
        let page: CursorPage<CommentResponse> = server
            .get(&format!("/articles/{}/comments?limit=10", article.id))
            .await
            .json();
        assert_eq!(page.list.len(), 10);
        assert_eq!(page.list[0].content, "comment 24");
        let cursor = page.next_cursor.expect("expected a next cursor");
        let mut seen: Vec<String> = page.list.into_iter().map(|c| c.content).collect();

        // Second page.
        let page: CursorPage<CommentResponse> = server
            .get(&format!("/articles/{}/comments?limit=10&cursor={cursor}", article.id))
            .await
            .json();
        assert_eq!(page.list.len(), 10);
        let cursor = page.next_cursor.expect("expected a next cursor");
        seen.extend(page.list.into_iter().map(|c| c.content));

        // Final page: 5 items, no cursor.
        let page: CursorPage<CommentResponse> = server
            .get(&format!("/articles/{}/comments?limit=10&cursor={cursor}", article.id))
            .await
            .json();
        assert_eq!(page.list.len(), 5);
        assert!(page.next_cursor.is_none());
        seen.extend(page.list.into_iter().map(|c| c.content));

        let expected: Vec<String> = (0..25).rev().map(|i| format!("comment {i}")).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_unknown_cursor_is_bad_request() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;
        let article = create_article_via_api(&server, &alice, "discussed").await;

        let response = server
            .get(&format!(
                "/articles/{}/comments?cursor={}",
                article.id,
                uuid::Uuid::new_v4()
            ))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_comments_require_existing_article() {
        let (server, _state) = create_test_server();
        let alice = register_and_login(&server, "a@x.com", "alice").await;

        let response = server
            .post(&format!("/articles/{}/comments", uuid::Uuid::new_v4()))
            .add_header("cookie", alice)
            .json(&serde_json::json!({ "content": "hello" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_rejected() {
        // Deleting users is out of scope, but a token whose subject never
        // existed exercises the same middleware path.
        let (server, state) = create_test_server();
        server.post("/auth/register").json(&register_request("a@x.com", "alice")).await;
        let _cookie = login_cookie(&server, "a@x.com").await;

        let pair = state.tokens.issue_pair(uuid::Uuid::new_v4()).unwrap();
        let response = server
            .post("/articles")
            .add_header("cookie", format!("access_token={}", pair.access))
            .json(&serde_json::json!({ "title": "t", "content": "c" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
