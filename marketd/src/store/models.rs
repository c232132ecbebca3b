//! Store-side record and request types.
//!
//! These are distinct from the API models in [`crate::api::models`]: records
//! mirror what the store persists (including fields like `password_hash` that
//! must never cross the API boundary), and the API layer converts explicitly.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{ArticleId, CommentId, ProductId, UserId};

/// Outcome of a conditional owner-gated mutation.
///
/// The owner check is evaluated inside the store (update/delete-where-owner-
/// matches), so the outcome is authoritative even under concurrent requests.
#[derive(Debug)]
pub enum OwnerGated<T> {
    /// The caller owns the record and the mutation was applied.
    Applied(T),
    /// No record with that id exists.
    Missing,
    /// The record exists but is owned by someone else.
    NotOwner,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserCreate {
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
}

/// Partial user update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub nickname: Option<String>,
    pub image: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRecord {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ArticleCreate {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: CommentId,
    pub content: String,
    pub user_id: UserId,
    pub article_id: Option<ArticleId>,
    pub product_id: Option<ProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentCreate {
    pub content: String,
    pub user_id: UserId,
    pub parent: CommentParent,
}

/// A comment belongs to exactly one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentParent {
    Article(ArticleId),
    Product(ProductId),
}

impl CommentParent {
    pub fn matches(&self, comment: &CommentRecord) -> bool {
        match *self {
            CommentParent::Article(id) => comment.article_id == Some(id),
            CommentParent::Product(id) => comment.product_id == Some(id),
        }
    }
}

/// Target of a like relation; each kind has its own uniqueness-constrained
/// (user, target) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Article(ArticleId),
    Product(ProductId),
}

impl LikeTarget {
    pub fn id(&self) -> Uuid {
        match *self {
            LikeTarget::Article(id) | LikeTarget::Product(id) => id,
        }
    }
}

/// List ordering for article/product collection endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Newest first (creation time descending).
    #[default]
    Recent,
    /// Oldest first.
    Oldest,
}

/// Offset-paginated list query shared by articles and products.
///
/// `keyword` filters on title (articles) or name/description (products),
/// case-insensitively; interpretation is per store implementation.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub keyword: Option<String>,
    pub order: ListOrder,
    pub skip: i64,
    pub take: i64,
}
