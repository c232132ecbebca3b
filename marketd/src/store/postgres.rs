//! PostgreSQL store adapter.
//!
//! Invariants the rest of the system depends on live in the schema:
//! unique indexes on `users.email` / `users.nickname` and on the
//! (user, target) like pairs, foreign keys with `ON DELETE CASCADE`, and
//! the `(parent, created_at DESC, id DESC)` index backing keyset
//! pagination. Owner-gated mutations are single conditional statements
//! (`WHERE id = $1 AND user_id = $2`), so the owner check and the mutation
//! are atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::models::{
    ArticleCreate, ArticlePatch, ArticleRecord, CommentCreate, CommentParent, CommentRecord,
    LikeTarget, ListOrder, ListQuery, OwnerGated, ProductCreate, ProductPatch, ProductRecord,
    UserCreate, UserPatch, UserRecord,
};
use super::{ArticleStore, CommentStore, LikeStore, ProductStore, UserStore};
use crate::types::{ArticleId, CommentId, ProductId, UserId};

/// Get the marketd database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and run pending migrations.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        migrator().run(&pool).await?;
        Ok(Self::new(pool))
    }

    async fn row_exists(&self, table: &str, id: Uuid) -> Result<bool> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)");
        let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }
}

const USER_COLUMNS: &str = "id, email, nickname, password_hash, image, created_at, updated_at";
const ARTICLE_COLUMNS: &str = "id, title, content, user_id, created_at, updated_at";
const PRODUCT_COLUMNS: &str = "id, name, description, price, tags, images, user_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, user_id, article_id, product_id, created_at, updated_at";

fn list_order_sql(order: ListOrder) -> &'static str {
    match order {
        ListOrder::Recent => "created_at DESC, id DESC",
        ListOrder::Oldest => "created_at ASC, id ASC",
    }
}

fn like_table(target: LikeTarget) -> (&'static str, &'static str) {
    match target {
        LikeTarget::Article(_) => ("article_likes", "article_id"),
        LikeTarget::Product(_) => ("product_likes", "product_id"),
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create_user(&self, req: UserCreate) -> Result<UserRecord> {
        let sql = format!(
            "INSERT INTO users (id, email, nickname, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(&req.email)
            .bind(&req.nickname)
            .bind(&req.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_users_by_email(&self, email: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_users_by_nickname(&self, nickname: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE nickname = $1")
            .bind(nickname)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<UserRecord> {
        let sql = format!(
            "UPDATE users SET \
               nickname = COALESCE($2, nickname), \
               image = COALESCE($3, image), \
               password_hash = COALESCE($4, password_hash), \
               updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .bind(patch.nickname)
            .bind(patch.image)
            .bind(patch.password_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl ArticleStore for PostgresStore {
    async fn create_article(&self, req: ArticleCreate) -> Result<ArticleRecord> {
        let sql = format!(
            "INSERT INTO articles (id, title, content, user_id) VALUES ($1, $2, $3, $4) RETURNING {ARTICLE_COLUMNS}"
        );
        let article = sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(&req.title)
            .bind(&req.content)
            .bind(req.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(article)
    }

    async fn find_article_by_id(&self, id: ArticleId) -> Result<Option<ArticleRecord>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        Ok(sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_articles(&self, query: &ListQuery) -> Result<Vec<ArticleRecord>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%') \
             ORDER BY {} OFFSET $2 LIMIT $3",
            list_order_sql(query.order)
        );
        Ok(sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(query.keyword.as_deref())
            .bind(query.skip.max(0))
            .bind(query.take.max(0))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_articles(&self, keyword: Option<&str>) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')")
                .bind(keyword)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn update_article_owned(
        &self,
        id: ArticleId,
        owner: UserId,
        patch: ArticlePatch,
    ) -> Result<OwnerGated<ArticleRecord>> {
        let sql = format!(
            "UPDATE articles SET \
               title = COALESCE($3, title), \
               content = COALESCE($4, content), \
               updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {ARTICLE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(id)
            .bind(owner)
            .bind(patch.title)
            .bind(patch.content)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(article) => Ok(OwnerGated::Applied(article)),
            None if self.row_exists("articles", id).await? => Ok(OwnerGated::NotOwner),
            None => Ok(OwnerGated::Missing),
        }
    }

    async fn delete_article_owned(&self, id: ArticleId, owner: UserId) -> Result<OwnerGated<()>> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            Ok(OwnerGated::Applied(()))
        } else if self.row_exists("articles", id).await? {
            Ok(OwnerGated::NotOwner)
        } else {
            Ok(OwnerGated::Missing)
        }
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn create_product(&self, req: ProductCreate) -> Result<ProductRecord> {
        let sql = format!(
            "INSERT INTO products (id, name, description, price, tags, images, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(&req.name)
            .bind(&req.description)
            .bind(req.price)
            .bind(&req.tags)
            .bind(&req.images)
            .bind(req.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_products(&self, query: &ListQuery) -> Result<Vec<ProductRecord>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%') \
             ORDER BY {} OFFSET $2 LIMIT $3",
            list_order_sql(query.order)
        );
        Ok(sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(query.keyword.as_deref())
            .bind(query.skip.max(0))
            .bind(query.take.max(0))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_products(&self, keyword: Option<&str>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%')",
        )
        .bind(keyword)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_products_by_owner(&self, owner: UserId) -> Result<Vec<ProductRecord>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, ProductRecord>(&sql).bind(owner).fetch_all(&self.pool).await?)
    }

    async fn list_products_liked_by(&self, user: UserId) -> Result<Vec<ProductRecord>> {
        let product_columns = "p.id, p.name, p.description, p.price, p.tags, p.images, p.user_id, p.created_at, p.updated_at";
        let sql = format!(
            "SELECT {product_columns} FROM products p \
             JOIN product_likes pl ON pl.product_id = p.id \
             WHERE pl.user_id = $1 ORDER BY pl.created_at DESC"
        );
        Ok(sqlx::query_as::<_, ProductRecord>(&sql).bind(user).fetch_all(&self.pool).await?)
    }

    async fn update_product_owned(
        &self,
        id: ProductId,
        owner: UserId,
        patch: ProductPatch,
    ) -> Result<OwnerGated<ProductRecord>> {
        let sql = format!(
            "UPDATE products SET \
               name = COALESCE($3, name), \
               description = COALESCE($4, description), \
               price = COALESCE($5, price), \
               tags = COALESCE($6, tags), \
               images = COALESCE($7, images), \
               updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(id)
            .bind(owner)
            .bind(patch.name)
            .bind(patch.description)
            .bind(patch.price)
            .bind(patch.tags)
            .bind(patch.images)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(product) => Ok(OwnerGated::Applied(product)),
            None if self.row_exists("products", id).await? => Ok(OwnerGated::NotOwner),
            None => Ok(OwnerGated::Missing),
        }
    }

    async fn delete_product_owned(&self, id: ProductId, owner: UserId) -> Result<OwnerGated<()>> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            Ok(OwnerGated::Applied(()))
        } else if self.row_exists("products", id).await? {
            Ok(OwnerGated::NotOwner)
        } else {
            Ok(OwnerGated::Missing)
        }
    }
}

#[async_trait]
impl CommentStore for PostgresStore {
    async fn create_comment(&self, req: CommentCreate) -> Result<CommentRecord> {
        let (article_id, product_id) = match req.parent {
            CommentParent::Article(id) => (Some(id), None),
            CommentParent::Product(id) => (None, Some(id)),
        };
        let sql = format!(
            "INSERT INTO comments (id, content, user_id, article_id, product_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        );
        let comment = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(&req.content)
            .bind(req.user_id)
            .bind(article_id)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn find_comment_by_id(&self, id: CommentId) -> Result<Option<CommentRecord>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        Ok(sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn page_comments(
        &self,
        parent: CommentParent,
        cursor: Option<CommentId>,
        take: i64,
    ) -> Result<Vec<CommentRecord>> {
        let (parent_column, parent_id) = match parent {
            CommentParent::Article(id) => ("article_id", id),
            CommentParent::Product(id) => ("product_id", id),
        };

        // Resolve the cursor to its keyset position; an unknown cursor is a
        // caller error, not an empty page.
        let cursor_key: Option<(DateTime<Utc>, Uuid)> = match cursor {
            Some(cursor_id) => {
                let sql = format!("SELECT created_at FROM comments WHERE id = $1 AND {parent_column} = $2");
                let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(&sql)
                    .bind(cursor_id)
                    .bind(parent_id)
                    .fetch_optional(&self.pool)
                    .await?;
                match created_at {
                    Some(created_at) => Some((created_at, cursor_id)),
                    None => return Err(StoreError::NotFound),
                }
            }
            None => None,
        };
        let (cursor_created_at, cursor_id) = match cursor_key {
            Some((created_at, id)) => (Some(created_at), Some(id)),
            None => (None, None),
        };

        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE {parent_column} = $1 \
               AND ($2::timestamptz IS NULL OR (created_at, id) < ($2::timestamptz, $3::uuid)) \
             ORDER BY created_at DESC, id DESC LIMIT $4"
        );
        Ok(sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(parent_id)
            .bind(cursor_created_at)
            .bind(cursor_id)
            .bind(take.max(0))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_comment_owned(
        &self,
        id: CommentId,
        owner: UserId,
        content: String,
    ) -> Result<OwnerGated<CommentRecord>> {
        let sql = format!(
            "UPDATE comments SET content = $3, updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(id)
            .bind(owner)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(comment) => Ok(OwnerGated::Applied(comment)),
            None if self.row_exists("comments", id).await? => Ok(OwnerGated::NotOwner),
            None => Ok(OwnerGated::Missing),
        }
    }

    async fn delete_comment_owned(&self, id: CommentId, owner: UserId) -> Result<OwnerGated<()>> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            Ok(OwnerGated::Applied(()))
        } else if self.row_exists("comments", id).await? {
            Ok(OwnerGated::NotOwner)
        } else {
            Ok(OwnerGated::Missing)
        }
    }
}

#[async_trait]
impl LikeStore for PostgresStore {
    async fn like_exists(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let (table, column) = like_table(target);
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE user_id = $1 AND {column} = $2)");
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(user)
            .bind(target.id())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create_like(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let (table, column) = like_table(target);
        // ON CONFLICT DO NOTHING: a racing duplicate insert is reported as
        // "already present" instead of surfacing the constraint error.
        let sql = format!("INSERT INTO {table} (user_id, {column}) VALUES ($1, $2) ON CONFLICT DO NOTHING");
        let result = sqlx::query(&sql).bind(user).bind(target.id()).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_like(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let (table, column) = like_table(target);
        let sql = format!("DELETE FROM {table} WHERE user_id = $1 AND {column} = $2");
        let result = sqlx::query(&sql).bind(user).bind(target.id()).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
