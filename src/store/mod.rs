//! Persistence for users, tokens, study groups and flashcards.
//!
//! Handlers only see the [`Store`] trait. [`PgStore`] backs the running
//! service; [`MemoryStore`] keeps everything in process for tests and
//! `STORE_BACKEND=memory`.
//!
//! Ordering contract shared by both backends: groups and flashcards are
//! listed in insertion order, members in join order.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::flashcards::repo_types::{Flashcard, FlashcardChanges, NewFlashcard};
use crate::groups::repo_types::{GroupChanges, NewGroup, StudyGroup};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate value for {field}")]
    UniqueViolation { field: &'static str },

    /// The write points at a row that does not exist.
    #[error("referenced {entity} does not exist")]
    MissingReference { entity: &'static str },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    // ---- users ----

    /// Fails with [`StoreError::UniqueViolation`] when the username is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    // ---- tokens ----

    /// Returns the user's existing token, or stores `candidate` as the token.
    async fn get_or_create_token(&self, user_id: Uuid, candidate: &str) -> StoreResult<String>;
    async fn resolve_token(&self, key: &str) -> StoreResult<Option<Uuid>>;

    // ---- study groups ----

    async fn count_groups(&self) -> StoreResult<i64>;
    async fn list_groups(&self, limit: i64, offset: i64) -> StoreResult<Vec<StudyGroup>>;
    /// Inserts the group and the creator's membership atomically.
    async fn create_group(&self, creator_id: Uuid, group: NewGroup) -> StoreResult<StudyGroup>;
    async fn find_group(&self, id: Uuid) -> StoreResult<Option<StudyGroup>>;
    /// `None` when the group no longer exists.
    async fn update_group(&self, id: Uuid, changes: GroupChanges)
        -> StoreResult<Option<StudyGroup>>;
    /// Removes the group and its memberships. `false` when nothing was deleted.
    async fn delete_group(&self, id: Uuid) -> StoreResult<bool>;
    /// Idempotent. `false` when the group does not exist.
    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    // ---- flashcards (always scoped by owner) ----

    async fn count_flashcards(&self, owner: Uuid) -> StoreResult<i64>;
    async fn list_flashcards(
        &self,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Flashcard>>;
    async fn create_flashcard(&self, owner: Uuid, card: NewFlashcard) -> StoreResult<Flashcard>;
    async fn find_flashcard(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Flashcard>>;
    async fn update_flashcard(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: FlashcardChanges,
    ) -> StoreResult<Option<Flashcard>>;
    async fn delete_flashcard(&self, id: Uuid, owner: Uuid) -> StoreResult<bool>;
}
