//! Like toggle engine.
//!
//! A like is a uniqueness-constrained (user, target) relation: presence
//! means "liked". Toggling flips that presence and reports the resulting
//! state. The flip is expressed entirely through store-conditional
//! operations so concurrent toggles cannot corrupt the relation:
//!
//! - delete-first: an affected row means the like existed and is now gone;
//! - otherwise create: a uniqueness conflict means another toggle created
//!   the row concurrently, which resolves to the same observable state as
//!   a clean insert ("liked").

use crate::errors::Error;
use crate::store::{DynStore, LikeTarget, StoreError};
use crate::types::UserId;

/// Flip the like relation for (user, target); returns the resulting state
/// (`true` = liked).
pub async fn toggle(store: &DynStore, user: UserId, target: LikeTarget) -> Result<bool, Error> {
    if store.delete_like(user, target).await? {
        return Ok(false);
    }

    match store.create_like(user, target).await {
        // Clean insert, or the pair already existed (concurrent toggle won
        // the race) - either way the relation now holds.
        Ok(_) => Ok(true),
        Err(StoreError::UniqueViolation { .. }) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ArticleCreate;
    use crate::test_utils::{create_test_state, create_test_user};

    #[tokio::test]
    async fn test_toggle_involution() {
        let state = create_test_state();
        let user = create_test_user(&state, "a@x.com", "a").await;
        let article = state
            .store
            .create_article(ArticleCreate {
                title: "t".to_string(),
                content: "c".to_string(),
                user_id: user.id,
            })
            .await
            .unwrap();
        let target = LikeTarget::Article(article.id);

        assert!(toggle(&state.store, user.id, target).await.unwrap());
        assert!(!toggle(&state.store, user.id, target).await.unwrap());
        assert!(toggle(&state.store, user.id, target).await.unwrap());
    }

    #[tokio::test]
    async fn test_likes_are_per_user() {
        let state = create_test_state();
        let alice = create_test_user(&state, "a@x.com", "a").await;
        let bob = create_test_user(&state, "b@x.com", "b").await;
        let article = state
            .store
            .create_article(ArticleCreate {
                title: "t".to_string(),
                content: "c".to_string(),
                user_id: alice.id,
            })
            .await
            .unwrap();
        let target = LikeTarget::Article(article.id);

        assert!(toggle(&state.store, alice.id, target).await.unwrap());
        // Bob toggling creates his own relation, Alice's stays.
        assert!(toggle(&state.store, bob.id, target).await.unwrap());
        assert!(state.store.like_exists(alice.id, target).await.unwrap());
        assert!(!toggle(&state.store, alice.id, target).await.unwrap());
        assert!(state.store.like_exists(bob.id, target).await.unwrap());
    }
}
