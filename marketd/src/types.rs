//! Shared identifier aliases.
//!
//! All entities are keyed by UUIDs (v7, so ids sort by creation time).
//! The aliases exist to keep signatures self-describing; they are not
//! newtypes and carry no extra invariants.

use uuid::Uuid;

pub type UserId = Uuid;
pub type ArticleId = Uuid;
pub type ProductId = Uuid;
pub type CommentId = Uuid;
