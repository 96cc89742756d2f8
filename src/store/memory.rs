use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::auth::repo_types::{PublicUser, User};
use crate::flashcards::repo_types::{Flashcard, FlashcardChanges, NewFlashcard};
use crate::groups::repo_types::{GroupChanges, NewGroup, StudyGroup};

#[derive(Debug)]
struct GroupRecord {
    id: Uuid,
    name: String,
    description: String,
    creator_id: Uuid,
    members: Vec<Uuid>,
    created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    tokens: Vec<(String, Uuid)>,
    groups: Vec<GroupRecord>,
    flashcards: Vec<Flashcard>,
}

impl Inner {
    /// Mirrors the foreign keys on `users`.
    fn ensure_user(&self, id: Uuid) -> StoreResult<()> {
        if self.users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference { entity: "user" })
        }
    }

    fn public_user(&self, id: Uuid) -> Option<PublicUser> {
        self.users.iter().find(|u| u.id == id).map(PublicUser::from)
    }

    fn resolve(&self, record: &GroupRecord) -> Option<StudyGroup> {
        Some(StudyGroup {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            creator: self.public_user(record.creator_id)?,
            members: record
                .members
                .iter()
                .filter_map(|id| self.public_user(*id))
                .collect(),
            created_at: record.created_at,
        })
    }
}

/// In-process [`Store`]; every operation runs under one lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation { field: "username" });
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_or_create_token(&self, user_id: Uuid, candidate: &str) -> StoreResult<String> {
        let mut inner = self.inner.lock().await;
        if let Some((key, _)) = inner.tokens.iter().find(|(_, uid)| *uid == user_id) {
            return Ok(key.clone());
        }
        inner.tokens.push((candidate.to_string(), user_id));
        Ok(candidate.to_string())
    }

    async fn resolve_token(&self, key: &str) -> StoreResult<Option<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tokens
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, uid)| *uid))
    }

    async fn count_groups(&self) -> StoreResult<i64> {
        Ok(self.inner.lock().await.groups.len() as i64)
    }

    async fn list_groups(&self, limit: i64, offset: i64) -> StoreResult<Vec<StudyGroup>> {
        let inner = self.inner.lock().await;
        Ok(window(
            inner.groups.iter().filter_map(|g| inner.resolve(g)),
            limit,
            offset,
        ))
    }

    async fn create_group(&self, creator_id: Uuid, group: NewGroup) -> StoreResult<StudyGroup> {
        let mut inner = self.inner.lock().await;
        inner.ensure_user(creator_id)?;
        let record = GroupRecord {
            id: Uuid::new_v4(),
            name: group.name,
            description: group.description,
            creator_id,
            members: vec![creator_id],
            created_at: OffsetDateTime::now_utc(),
        };
        let created = inner
            .resolve(&record)
            .ok_or(StoreError::MissingReference { entity: "user" })?;
        inner.groups.push(record);
        Ok(created)
    }

    async fn find_group(&self, id: Uuid) -> StoreResult<Option<StudyGroup>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .groups
            .iter()
            .find(|g| g.id == id)
            .and_then(|g| inner.resolve(g)))
    }

    async fn update_group(
        &self,
        id: Uuid,
        changes: GroupChanges,
    ) -> StoreResult<Option<StudyGroup>> {
        let mut inner = self.inner.lock().await;
        let Some(record) = inner.groups.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        let inner = &*inner;
        Ok(inner
            .groups
            .iter()
            .find(|g| g.id == id)
            .and_then(|g| inner.resolve(g)))
    }

    async fn delete_group(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.groups.len();
        inner.groups.retain(|g| g.id != id);
        Ok(inner.groups.len() < before)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        let Some(record) = inner.groups.iter_mut().find(|g| g.id == group_id) else {
            return Ok(false);
        };
        if !record.members.contains(&user_id) {
            record.members.push(user_id);
        }
        Ok(true)
    }

    async fn count_flashcards(&self, owner: Uuid) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.flashcards.iter().filter(|c| c.user_id == owner).count() as i64)
    }

    async fn list_flashcards(
        &self,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Flashcard>> {
        let inner = self.inner.lock().await;
        Ok(window(
            inner
                .flashcards
                .iter()
                .filter(|c| c.user_id == owner)
                .cloned(),
            limit,
            offset,
        ))
    }

    async fn create_flashcard(&self, owner: Uuid, card: NewFlashcard) -> StoreResult<Flashcard> {
        let mut inner = self.inner.lock().await;
        inner.ensure_user(owner)?;
        let card = Flashcard {
            id: Uuid::new_v4(),
            user_id: owner,
            front: card.front,
            back: card.back,
            category: card.category,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.flashcards.push(card.clone());
        Ok(card)
    }

    async fn find_flashcard(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Flashcard>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .flashcards
            .iter()
            .find(|c| c.id == id && c.user_id == owner)
            .cloned())
    }

    async fn update_flashcard(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: FlashcardChanges,
    ) -> StoreResult<Option<Flashcard>> {
        let mut inner = self.inner.lock().await;
        let Some(card) = inner
            .flashcards
            .iter_mut()
            .find(|c| c.id == id && c.user_id == owner)
        else {
            return Ok(None);
        };
        changes.apply(card);
        Ok(Some(card.clone()))
    }

    async fn delete_flashcard(&self, id: Uuid, owner: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.flashcards.len();
        inner
            .flashcards
            .retain(|c| !(c.id == id && c.user_id == owner));
        Ok(inner.flashcards.len() < before)
    }
}
