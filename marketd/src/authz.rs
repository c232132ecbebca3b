//! Ownership authorization gate.
//!
//! Mutating operations on articles, products and comments are restricted to
//! the identity that created the resource. The owner comparison happens
//! inside the store as a conditional mutation (update/delete-where-owner-
//! matches), so there is no check-then-act window; this module only
//! translates the store's [`OwnerGated`] outcome into the error taxonomy.
//!
//! `Forbidden` (valid identity, wrong owner) is deliberately distinct from
//! `Unauthenticated` (no valid identity): 403 vs 401.

use crate::errors::Error;
use crate::store::OwnerGated;

/// Translate an owner-gated outcome: `Missing` becomes `NotFound` for the
/// named resource, `NotOwner` becomes `Forbidden` for the attempted action.
pub fn resolve<T>(
    outcome: OwnerGated<T>,
    resource: &str,
    id: impl std::fmt::Display,
    action: &str,
) -> Result<T, Error> {
    match outcome {
        OwnerGated::Applied(value) => Ok(value),
        OwnerGated::Missing => Err(Error::not_found(resource, id)),
        OwnerGated::NotOwner => Err(Error::forbidden(action)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_outcome_translation() {
        let id = uuid::Uuid::nil();

        assert_eq!(
            resolve(OwnerGated::Applied(7), "article", id, "update article").unwrap(),
            7
        );

        let err = resolve::<()>(OwnerGated::Missing, "article", id, "update article").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = resolve::<()>(OwnerGated::NotOwner, "article", id, "update article").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
