//! In-memory store implementation.
//!
//! Backs tests and dependency-free local development. All tables live
//! behind a single `RwLock`, which makes every store operation atomic —
//! the same guarantee the PostgreSQL adapter gets from row conditions and
//! unique indexes. No lock is ever held across an await point.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::models::{
    ArticleCreate, ArticlePatch, ArticleRecord, CommentCreate, CommentParent, CommentRecord,
    LikeTarget, ListOrder, ListQuery, OwnerGated, ProductCreate, ProductPatch, ProductRecord,
    UserCreate, UserPatch, UserRecord,
};
use super::{ArticleStore, CommentStore, LikeStore, ProductStore, UserStore};
use crate::types::{ArticleId, CommentId, ProductId, UserId};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserRecord>,
    articles: HashMap<ArticleId, ArticleRecord>,
    products: HashMap<ProductId, ProductRecord>,
    comments: HashMap<CommentId, CommentRecord>,
    article_likes: HashMap<(UserId, ArticleId), DateTime<Utc>>,
    product_likes: HashMap<(UserId, ProductId), DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unique_violation(table: &str, constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

fn fk_violation(table: &str, constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("insert violates foreign key constraint \"{constraint}\""),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Descending (created_at, id) sort shared by list and page queries.
fn sort_newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn apply_list_query<T: Clone>(
    mut rows: Vec<T>,
    query: &ListQuery,
    key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
) -> Vec<T> {
    match query.order {
        ListOrder::Recent => sort_newest_first(&mut rows, key),
        ListOrder::Oldest => rows.sort_by(|a, b| key(a).cmp(&key(b))),
    }
    rows.into_iter()
        .skip(query.skip.max(0) as usize)
        .take(query.take.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, req: UserCreate) -> Result<UserRecord> {
        let mut tables = self.write();
        if tables.users.values().any(|u| u.email == req.email) {
            return Err(unique_violation("users", "users_email_key"));
        }
        if tables.users.values().any(|u| u.nickname == req.nickname) {
            return Err(unique_violation("users", "users_nickname_key"));
        }
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::now_v7(),
            email: req.email,
            nickname: req.nickname,
            password_hash: req.password_hash,
            image: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn count_users_by_email(&self, email: &str) -> Result<i64> {
        Ok(self.read().users.values().filter(|u| u.email == email).count() as i64)
    }

    async fn count_users_by_nickname(&self, nickname: &str) -> Result<i64> {
        Ok(self.read().users.values().filter(|u| u.nickname == nickname).count() as i64)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<UserRecord> {
        let mut tables = self.write();
        if let Some(nickname) = &patch.nickname {
            if tables.users.values().any(|u| u.id != id && u.nickname == *nickname) {
                return Err(unique_violation("users", "users_nickname_key"));
            }
        }
        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(nickname) = patch.nickname {
            user.nickname = nickname;
        }
        if let Some(image) = patch.image {
            user.image = Some(image);
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn create_article(&self, req: ArticleCreate) -> Result<ArticleRecord> {
        let mut tables = self.write();
        if !tables.users.contains_key(&req.user_id) {
            return Err(fk_violation("articles", "articles_user_id_fkey"));
        }
        let now = Utc::now();
        let article = ArticleRecord {
            id: Uuid::now_v7(),
            title: req.title,
            content: req.content,
            user_id: req.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn find_article_by_id(&self, id: ArticleId) -> Result<Option<ArticleRecord>> {
        Ok(self.read().articles.get(&id).cloned())
    }

    async fn list_articles(&self, query: &ListQuery) -> Result<Vec<ArticleRecord>> {
        let rows: Vec<ArticleRecord> = self
            .read()
            .articles
            .values()
            .filter(|a| query.keyword.as_deref().is_none_or(|k| contains_ci(&a.title, k)))
            .cloned()
            .collect();
        Ok(apply_list_query(rows, query, |a| (a.created_at, a.id)))
    }

    async fn count_articles(&self, keyword: Option<&str>) -> Result<i64> {
        Ok(self
            .read()
            .articles
            .values()
            .filter(|a| keyword.is_none_or(|k| contains_ci(&a.title, k)))
            .count() as i64)
    }

    async fn update_article_owned(
        &self,
        id: ArticleId,
        owner: UserId,
        patch: ArticlePatch,
    ) -> Result<OwnerGated<ArticleRecord>> {
        let mut tables = self.write();
        let Some(article) = tables.articles.get_mut(&id) else {
            return Ok(OwnerGated::Missing);
        };
        if article.user_id != owner {
            return Ok(OwnerGated::NotOwner);
        }
        if let Some(title) = patch.title {
            article.title = title;
        }
        if let Some(content) = patch.content {
            article.content = content;
        }
        article.updated_at = Utc::now();
        Ok(OwnerGated::Applied(article.clone()))
    }

    async fn delete_article_owned(&self, id: ArticleId, owner: UserId) -> Result<OwnerGated<()>> {
        let mut tables = self.write();
        match tables.articles.get(&id) {
            None => return Ok(OwnerGated::Missing),
            Some(article) if article.user_id != owner => return Ok(OwnerGated::NotOwner),
            Some(_) => {}
        }
        tables.articles.remove(&id);
        // Cascade, matching the SQL schema's ON DELETE CASCADE.
        tables.comments.retain(|_, c| c.article_id != Some(id));
        tables.article_likes.retain(|(_, article_id), _| *article_id != id);
        Ok(OwnerGated::Applied(()))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create_product(&self, req: ProductCreate) -> Result<ProductRecord> {
        let mut tables = self.write();
        if !tables.users.contains_key(&req.user_id) {
            return Err(fk_violation("products", "products_user_id_fkey"));
        }
        let now = Utc::now();
        let product = ProductRecord {
            id: Uuid::now_v7(),
            name: req.name,
            description: req.description,
            price: req.price,
            tags: req.tags,
            images: req.images,
            user_id: req.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.read().products.get(&id).cloned())
    }

    async fn list_products(&self, query: &ListQuery) -> Result<Vec<ProductRecord>> {
        let rows: Vec<ProductRecord> = self
            .read()
            .products
            .values()
            .filter(|p| {
                query
                    .keyword
                    .as_deref()
                    .is_none_or(|k| contains_ci(&p.name, k) || contains_ci(&p.description, k))
            })
            .cloned()
            .collect();
        Ok(apply_list_query(rows, query, |p| (p.created_at, p.id)))
    }

    async fn count_products(&self, keyword: Option<&str>) -> Result<i64> {
        Ok(self
            .read()
            .products
            .values()
            .filter(|p| keyword.is_none_or(|k| contains_ci(&p.name, k) || contains_ci(&p.description, k)))
            .count() as i64)
    }

    async fn list_products_by_owner(&self, owner: UserId) -> Result<Vec<ProductRecord>> {
        let mut rows: Vec<ProductRecord> = self
            .read()
            .products
            .values()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect();
        sort_newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn list_products_liked_by(&self, user: UserId) -> Result<Vec<ProductRecord>> {
        let tables = self.read();
        let mut liked: Vec<(DateTime<Utc>, ProductRecord)> = tables
            .product_likes
            .iter()
            .filter(|((user_id, _), _)| *user_id == user)
            .filter_map(|((_, product_id), liked_at)| {
                tables.products.get(product_id).map(|p| (*liked_at, p.clone()))
            })
            .collect();
        liked.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(liked.into_iter().map(|(_, p)| p).collect())
    }

    async fn update_product_owned(
        &self,
        id: ProductId,
        owner: UserId,
        patch: ProductPatch,
    ) -> Result<OwnerGated<ProductRecord>> {
        let mut tables = self.write();
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(OwnerGated::Missing);
        };
        if product.user_id != owner {
            return Ok(OwnerGated::NotOwner);
        }
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(tags) = patch.tags {
            product.tags = tags;
        }
        if let Some(images) = patch.images {
            product.images = images;
        }
        product.updated_at = Utc::now();
        Ok(OwnerGated::Applied(product.clone()))
    }

    async fn delete_product_owned(&self, id: ProductId, owner: UserId) -> Result<OwnerGated<()>> {
        let mut tables = self.write();
        match tables.products.get(&id) {
            None => return Ok(OwnerGated::Missing),
            Some(product) if product.user_id != owner => return Ok(OwnerGated::NotOwner),
            Some(_) => {}
        }
        tables.products.remove(&id);
        tables.comments.retain(|_, c| c.product_id != Some(id));
        tables.product_likes.retain(|(_, product_id), _| *product_id != id);
        Ok(OwnerGated::Applied(()))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create_comment(&self, req: CommentCreate) -> Result<CommentRecord> {
        let mut tables = self.write();
        let (article_id, product_id) = match req.parent {
            CommentParent::Article(id) => {
                if !tables.articles.contains_key(&id) {
                    return Err(fk_violation("comments", "comments_article_id_fkey"));
                }
                (Some(id), None)
            }
            CommentParent::Product(id) => {
                if !tables.products.contains_key(&id) {
                    return Err(fk_violation("comments", "comments_product_id_fkey"));
                }
                (None, Some(id))
            }
        };
        let now = Utc::now();
        let comment = CommentRecord {
            id: Uuid::now_v7(),
            content: req.content,
            user_id: req.user_id,
            article_id,
            product_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment_by_id(&self, id: CommentId) -> Result<Option<CommentRecord>> {
        Ok(self.read().comments.get(&id).cloned())
    }

    async fn page_comments(
        &self,
        parent: CommentParent,
        cursor: Option<CommentId>,
        take: i64,
    ) -> Result<Vec<CommentRecord>> {
        let tables = self.read();
        let cursor_key = match cursor {
            Some(id) => match tables.comments.get(&id) {
                Some(c) if parent.matches(c) => Some((c.created_at, c.id)),
                _ => return Err(StoreError::NotFound),
            },
            None => None,
        };
        let mut rows: Vec<CommentRecord> = tables
            .comments
            .values()
            .filter(|c| parent.matches(c))
            .filter(|c| cursor_key.is_none_or(|key| (c.created_at, c.id) < key))
            .cloned()
            .collect();
        sort_newest_first(&mut rows, |c| (c.created_at, c.id));
        rows.truncate(take.max(0) as usize);
        Ok(rows)
    }

    async fn update_comment_owned(
        &self,
        id: CommentId,
        owner: UserId,
        content: String,
    ) -> Result<OwnerGated<CommentRecord>> {
        let mut tables = self.write();
        let Some(comment) = tables.comments.get_mut(&id) else {
            return Ok(OwnerGated::Missing);
        };
        if comment.user_id != owner {
            return Ok(OwnerGated::NotOwner);
        }
        comment.content = content;
        comment.updated_at = Utc::now();
        Ok(OwnerGated::Applied(comment.clone()))
    }

    async fn delete_comment_owned(&self, id: CommentId, owner: UserId) -> Result<OwnerGated<()>> {
        let mut tables = self.write();
        match tables.comments.get(&id) {
            None => return Ok(OwnerGated::Missing),
            Some(comment) if comment.user_id != owner => return Ok(OwnerGated::NotOwner),
            Some(_) => {}
        }
        tables.comments.remove(&id);
        Ok(OwnerGated::Applied(()))
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn like_exists(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let tables = self.read();
        Ok(match target {
            LikeTarget::Article(id) => tables.article_likes.contains_key(&(user, id)),
            LikeTarget::Product(id) => tables.product_likes.contains_key(&(user, id)),
        })
    }

    async fn create_like(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let mut tables = self.write();
        match target {
            LikeTarget::Article(id) => {
                if !tables.articles.contains_key(&id) {
                    return Err(fk_violation("article_likes", "article_likes_article_id_fkey"));
                }
                Ok(tables.article_likes.insert((user, id), Utc::now()).is_none())
            }
            LikeTarget::Product(id) => {
                if !tables.products.contains_key(&id) {
                    return Err(fk_violation("product_likes", "product_likes_product_id_fkey"));
                }
                Ok(tables.product_likes.insert((user, id), Utc::now()).is_none())
            }
        }
    }

    async fn delete_like(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let mut tables = self.write();
        Ok(match target {
            LikeTarget::Article(id) => tables.article_likes.remove(&(user, id)).is_some(),
            LikeTarget::Product(id) => tables.product_likes.remove(&(user, id)).is_some(),
        })
    }
}
