//! API request and response data models.
//!
//! These define the public API contract and are distinct from the store
//! records in [`crate::store::models`], so the wire format and the storage
//! representation can evolve independently. All models carry `utoipa`
//! annotations for the generated OpenAPI document.

pub mod articles;
pub mod auth;
pub mod comments;
pub mod likes;
pub mod pagination;
pub mod products;
pub mod users;
