use tracing::info;
use uuid::Uuid;

use super::repo_types::{Flashcard, FlashcardChanges, NewFlashcard};
use crate::access::{resolve_flashcard_for_user, FLASHCARD_NOT_FOUND};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Page, PageQuery};
use crate::store::Store;

pub async fn list(store: &dyn Store, owner: Uuid, query: PageQuery) -> ApiResult<Page<Flashcard>> {
    let (limit, offset) = query.window();
    let count = store.count_flashcards(owner).await?;
    let results = if limit > 0 {
        store.list_flashcards(owner, limit, offset).await?
    } else {
        Vec::new()
    };
    Ok(Page::new("/flashcards", query, count, results))
}

pub async fn create(store: &dyn Store, owner: Uuid, card: NewFlashcard) -> ApiResult<Flashcard> {
    let card = store.create_flashcard(owner, card).await?;
    info!(flashcard_id = %card.id, owner = %owner, "flashcard created");
    Ok(card)
}

pub async fn get(store: &dyn Store, owner: Uuid, id: Uuid) -> ApiResult<Flashcard> {
    resolve_flashcard_for_user(store, id, owner).await
}

/// Resolution happens before validation, so a foreign card is 404 even when
/// the body is invalid.
pub async fn update(
    store: &dyn Store,
    owner: Uuid,
    id: Uuid,
    changes: ApiResult<FlashcardChanges>,
) -> ApiResult<Flashcard> {
    resolve_flashcard_for_user(store, id, owner).await?;
    let changes = changes?;
    store
        .update_flashcard(id, owner, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(FLASHCARD_NOT_FOUND))
}

pub async fn delete(store: &dyn Store, owner: Uuid, id: Uuid) -> ApiResult<()> {
    if !store.delete_flashcard(id, owner).await? {
        return Err(ApiError::not_found(FLASHCARD_NOT_FOUND));
    }
    info!(flashcard_id = %id, "flashcard deleted");
    Ok(())
}
