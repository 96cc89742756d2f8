use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::repo_types::PublicUser;

/// A study group with its creator and members resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudyGroup {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub creator: PublicUser,
    pub members: Vec<PublicUser>, // join order, creator first
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl StudyGroup {
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }
}

/// `study_groups` joined with the creator's public columns.
#[derive(Debug, FromRow)]
pub(crate) struct StudyGroupRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub creator_username: String,
    pub creator_email: String,
    pub created_at: OffsetDateTime,
}

impl StudyGroupRow {
    pub fn into_group(self, members: Vec<PublicUser>) -> StudyGroup {
        StudyGroup {
            id: self.id,
            name: self.name,
            description: self.description,
            creator: PublicUser {
                id: self.creator_id,
                username: self.creator_username,
                email: self.creator_email,
            },
            members,
            created_at: self.created_at,
        }
    }
}

/// Validated input for a new group.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}
