//! API request/response models for articles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::pagination::OffsetPagination;
use crate::store::{ArticleRecord, ListOrder, ListQuery};
use crate::types::{ArticleId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleCreateRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleResponse {
    #[schema(value_type = Uuid)]
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ArticleRecord> for ArticleResponse {
    fn from(record: ArticleRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            user_id: record.user_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Single-article view, personalized with the caller's like state when an
/// identity is present (anonymous callers always see `is_liked: false`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleDetailResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    pub is_liked: bool,
}

/// Sort order accepted by list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderParam {
    #[default]
    Recent,
    Oldest,
}

impl From<OrderParam> for ListOrder {
    fn from(order: OrderParam) -> Self {
        match order {
            OrderParam::Recent => ListOrder::Recent,
            OrderParam::Oldest => ListOrder::Oldest,
        }
    }
}

/// Query parameters for listing articles or products.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListParams {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: OffsetPagination,

    /// Sort order (default: recent)
    #[param(inline)]
    pub order: Option<OrderParam>,

    /// Case-insensitive keyword filter (title for articles, name or
    /// description for products)
    pub keyword: Option<String>,
}

impl ListParams {
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            keyword: self.keyword.clone(),
            order: self.order.unwrap_or_default().into(),
            skip: self.pagination.skip(),
            take: self.pagination.page_size(),
        }
    }
}
