//! Record store contract and implementations.
//!
//! The store is the single synchronization point of the system: every
//! cross-request invariant (ownership of a record, uniqueness of a like
//! pair, uniqueness of email/nickname) is enforced here, not in handler
//! code. Handlers perform optimistic checks for friendlier errors, but the
//! store outcome is authoritative under concurrency.
//!
//! Two implementations are provided:
//!
//! - [`memory::MemoryStore`]: a single-lock in-memory store used in tests
//!   and for dependency-free local development.
//! - [`postgres::PostgresStore`]: the production adapter, backed by sqlx.
//!
//! All traits are object safe; the application holds an `Arc<dyn Store>`.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::{Result, StoreError};
pub use models::{
    ArticleCreate, ArticlePatch, ArticleRecord, CommentCreate, CommentParent, CommentRecord,
    LikeTarget, ListOrder, ListQuery, OwnerGated, ProductCreate, ProductPatch, ProductRecord,
    UserCreate, UserPatch, UserRecord,
};

use crate::types::{ArticleId, CommentId, ProductId, UserId};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, req: UserCreate) -> Result<UserRecord>;
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    async fn count_users_by_email(&self, email: &str) -> Result<i64>;
    async fn count_users_by_nickname(&self, nickname: &str) -> Result<i64>;
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<UserRecord>;
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn create_article(&self, req: ArticleCreate) -> Result<ArticleRecord>;
    async fn find_article_by_id(&self, id: ArticleId) -> Result<Option<ArticleRecord>>;
    async fn list_articles(&self, query: &ListQuery) -> Result<Vec<ArticleRecord>>;
    async fn count_articles(&self, keyword: Option<&str>) -> Result<i64>;
    /// Conditional update: applies only when `owner` matches the recorded owner.
    async fn update_article_owned(
        &self,
        id: ArticleId,
        owner: UserId,
        patch: ArticlePatch,
    ) -> Result<OwnerGated<ArticleRecord>>;
    async fn delete_article_owned(&self, id: ArticleId, owner: UserId) -> Result<OwnerGated<()>>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create_product(&self, req: ProductCreate) -> Result<ProductRecord>;
    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>>;
    async fn list_products(&self, query: &ListQuery) -> Result<Vec<ProductRecord>>;
    async fn count_products(&self, keyword: Option<&str>) -> Result<i64>;
    /// Products created by `owner`, newest first.
    async fn list_products_by_owner(&self, owner: UserId) -> Result<Vec<ProductRecord>>;
    /// Products `user` has liked, most recently liked first.
    async fn list_products_liked_by(&self, user: UserId) -> Result<Vec<ProductRecord>>;
    async fn update_product_owned(
        &self,
        id: ProductId,
        owner: UserId,
        patch: ProductPatch,
    ) -> Result<OwnerGated<ProductRecord>>;
    async fn delete_product_owned(&self, id: ProductId, owner: UserId) -> Result<OwnerGated<()>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create_comment(&self, req: CommentCreate) -> Result<CommentRecord>;
    async fn find_comment_by_id(&self, id: CommentId) -> Result<Option<CommentRecord>>;
    /// Keyset page: up to `take` comments of `parent`, ordered
    /// `(created_at, id)` descending, strictly after the `cursor` row when
    /// one is given.
    ///
    /// Returns [`StoreError::NotFound`] when the cursor does not resolve to
    /// a comment of that parent.
    async fn page_comments(
        &self,
        parent: CommentParent,
        cursor: Option<CommentId>,
        take: i64,
    ) -> Result<Vec<CommentRecord>>;
    async fn update_comment_owned(
        &self,
        id: CommentId,
        owner: UserId,
        content: String,
    ) -> Result<OwnerGated<CommentRecord>>;
    async fn delete_comment_owned(&self, id: CommentId, owner: UserId) -> Result<OwnerGated<()>>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn like_exists(&self, user: UserId, target: LikeTarget) -> Result<bool>;
    /// Insert the like relation. Returns `false` when the pair already
    /// exists (a concurrent toggle won the race); the uniqueness constraint
    /// on (user, target) is the invariant guardian.
    async fn create_like(&self, user: UserId, target: LikeTarget) -> Result<bool>;
    /// Remove the like relation. Returns `true` when a row was removed.
    async fn delete_like(&self, user: UserId, target: LikeTarget) -> Result<bool>;
}

/// The full record-store contract consumed by the application.
pub trait Store: UserStore + ArticleStore + ProductStore + CommentStore + LikeStore {}

impl<T: UserStore + ArticleStore + ProductStore + CommentStore + LikeStore> Store for T {}

pub type DynStore = Arc<dyn Store>;
