//! API request/response models for products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::ProductRecord;
use crate::types::{ProductId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductCreateRequest {
    pub name: String,
    pub description: String,
    /// Price in minor currency units; must be non-negative
    pub price: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    #[schema(value_type = Uuid)]
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            price: record.price,
            tags: record.tags,
            images: record.images,
            user_id: record.user_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Single-product view with the caller's like state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub is_liked: bool,
}

/// Unpaginated product list (owned or liked products of the caller).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub list: Vec<ProductResponse>,
}
