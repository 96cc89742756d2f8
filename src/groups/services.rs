use tracing::{debug, info, warn};
use uuid::Uuid;

use super::repo_types::{GroupChanges, NewGroup, StudyGroup};
use crate::access::{can_join_group, ensure_can_modify_group};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Page, PageQuery};
use crate::store::Store;

pub const GROUP_NOT_FOUND: &str = "Group not found";

async fn find_or_404(store: &dyn Store, id: Uuid) -> ApiResult<StudyGroup> {
    store
        .find_group(id)
        .await?
        .ok_or_else(|| ApiError::not_found(GROUP_NOT_FOUND))
}

pub async fn list(store: &dyn Store, query: PageQuery) -> ApiResult<Page<StudyGroup>> {
    let (limit, offset) = query.window();
    let count = store.count_groups().await?;
    let results = if limit > 0 {
        store.list_groups(limit, offset).await?
    } else {
        Vec::new()
    };
    Ok(Page::new("/groups", query, count, results))
}

pub async fn create(store: &dyn Store, acting_user: Uuid, group: NewGroup) -> ApiResult<StudyGroup> {
    let group = store.create_group(acting_user, group).await?;
    info!(group_id = %group.id, creator = %acting_user, "group created");
    Ok(group)
}

pub async fn get(store: &dyn Store, id: Uuid) -> ApiResult<StudyGroup> {
    find_or_404(store, id).await
}

/// Existence is checked before authorization, and both before validation,
/// so `changes` arrives as an unvalidated result.
pub async fn update(
    store: &dyn Store,
    acting_user: Uuid,
    id: Uuid,
    changes: ApiResult<GroupChanges>,
) -> ApiResult<StudyGroup> {
    let group = find_or_404(store, id).await?;
    if let Err(e) = ensure_can_modify_group(&group, acting_user, "update") {
        warn!(group_id = %id, user_id = %acting_user, "update by non-creator rejected");
        return Err(e);
    }
    let changes = changes?;
    store
        .update_group(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(GROUP_NOT_FOUND))
}

pub async fn delete(store: &dyn Store, acting_user: Uuid, id: Uuid) -> ApiResult<()> {
    let group = find_or_404(store, id).await?;
    if let Err(e) = ensure_can_modify_group(&group, acting_user, "delete") {
        warn!(group_id = %id, user_id = %acting_user, "delete by non-creator rejected");
        return Err(e);
    }
    if !store.delete_group(id).await? {
        return Err(ApiError::not_found(GROUP_NOT_FOUND));
    }
    info!(group_id = %id, "group deleted");
    Ok(())
}

pub async fn join(store: &dyn Store, acting_user: Uuid, id: Uuid) -> ApiResult<()> {
    let group = find_or_404(store, id).await?;
    if !can_join_group(&group, acting_user) {
        return Err(ApiError::forbidden("You may not join this group"));
    }
    if group.is_member(acting_user) {
        debug!(group_id = %id, user_id = %acting_user, "already a member");
        return Ok(());
    }
    if !store.add_member(id, acting_user).await? {
        return Err(ApiError::not_found(GROUP_NOT_FOUND));
    }
    info!(group_id = %id, user_id = %acting_user, "joined group");
    Ok(())
}
