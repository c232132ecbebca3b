use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState, authz,
    api::models::comments::{CommentResponse, CommentUpdateRequest},
    auth::identity::RequireIdentity,
    errors::Error,
    types::CommentId,
};

/// Update a comment; only its author may do so
#[utoipa::path(
    patch,
    path = "/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment id")),
    request_body = CommentUpdateRequest,
    tag = "comments",
    responses(
        (status = 200, description = "Updated comment", body = CommentResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_comment(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<CommentId>,
    Json(request): Json<CommentUpdateRequest>,
) -> Result<Json<CommentResponse>, Error> {
    if request.content.is_empty() {
        return Err(Error::BadRequest {
            message: "Content must not be empty".to_string(),
        });
    }

    let outcome = state.store.update_comment_owned(id, user.id, request.content).await?;
    let comment = authz::resolve(outcome, "comment", id, "update this comment")?;
    Ok(Json(comment.into()))
}

/// Delete a comment; only its author may do so
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment id")),
    tag = "comments",
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found"),
    ),
    security(("session_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_comment(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    Path(id): Path<CommentId>,
) -> Result<StatusCode, Error> {
    let outcome = state.store.delete_comment_owned(id, user.id).await?;
    authz::resolve(outcome, "comment", id, "delete this comment")?;
    Ok(StatusCode::NO_CONTENT)
}
