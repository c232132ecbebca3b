//! API request/response models for comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::CommentRecord;
use crate::types::{ArticleId, CommentId, ProductId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentCreateRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentUpdateRequest {
    pub content: String,
}

/// Exactly one of `article_id` / `product_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    #[schema(value_type = Uuid)]
    pub id: CommentId,
    pub content: String,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    #[schema(value_type = Option<Uuid>)]
    pub article_id: Option<ArticleId>,
    #[schema(value_type = Option<Uuid>)]
    pub product_id: Option<ProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRecord> for CommentResponse {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            user_id: record.user_id,
            article_id: record.article_id,
            product_id: record.product_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
