//! Ownership and membership rules.
//!
//! The acting user is always passed in explicitly. Groups reveal their
//! existence to everyone, so a non-creator gets `Forbidden`. Flashcards never
//! do: a foreign card resolves exactly like a missing one.

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::flashcards::repo_types::Flashcard;
use crate::groups::repo_types::StudyGroup;
use crate::store::Store;

pub const FLASHCARD_NOT_FOUND: &str = "Flashcard not found";

/// Only the creator may rename, re-describe or delete a group.
pub fn can_modify_group(group: &StudyGroup, acting_user: Uuid) -> bool {
    group.creator.id == acting_user
}

/// Any authenticated user may join any existing group.
pub fn can_join_group(_group: &StudyGroup, _acting_user: Uuid) -> bool {
    true
}

pub fn ensure_can_modify_group(group: &StudyGroup, acting_user: Uuid, action: &str) -> ApiResult<()> {
    if can_modify_group(group, acting_user) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Only the creator can {action} this group"
        )))
    }
}

/// Looks a flashcard up by id and owner in one query.
pub async fn resolve_flashcard_for_user(
    store: &dyn Store,
    id: Uuid,
    acting_user: Uuid,
) -> ApiResult<Flashcard> {
    store
        .find_flashcard(id, acting_user)
        .await?
        .ok_or_else(|| ApiError::not_found(FLASHCARD_NOT_FOUND))
}
