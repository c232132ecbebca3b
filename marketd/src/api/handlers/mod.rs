//! HTTP request handlers.
//!
//! Handlers translate between the wire models in [`crate::api::models`] and
//! the store/auth layers. Authentication is handled entirely by the
//! extractors from [`crate::auth::identity`]; ownership checks go through
//! the store's conditional mutations and [`crate::authz`].

pub mod articles;
pub mod auth;
pub mod comments;
pub mod products;
