use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Flashcard {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid, // owner
    pub front: String,
    pub back: String,
    pub category: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFlashcard {
    pub front: String,
    pub back: String,
    pub category: Option<String>,
}

/// Partial update. `category: Some(None)` clears the category.
#[derive(Debug, Clone, Default)]
pub struct FlashcardChanges {
    pub front: Option<String>,
    pub back: Option<String>,
    pub category: Option<Option<String>>,
}

impl FlashcardChanges {
    pub fn apply(&self, card: &mut Flashcard) {
        if let Some(front) = &self.front {
            card.front = front.clone();
        }
        if let Some(back) = &self.back {
            card.back = back.clone();
        }
        if let Some(category) = &self.category {
            card.category = category.clone();
        }
    }
}
