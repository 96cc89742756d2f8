use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

use super::repo_types::{FlashcardChanges, NewFlashcard};
use crate::error::ApiError;
use crate::validation::{Validator, REQUIRED};

const CATEGORY_MAX_LEN: usize = 100;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Body of `POST /flashcards` and `PUT /flashcards/:id`. Owner and
/// creation time are never read from the client.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FlashcardRequest {
    #[schema(example = "2+2")]
    pub front: Option<String>,
    #[schema(example = "4")]
    pub back: Option<String>,
    /// `null` or blank clears the category on update.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, max_length = 100)]
    pub category: Option<Option<String>>,
}

impl FlashcardRequest {
    /// Blank or `null` category means "no category".
    fn category(&self, v: &mut Validator) -> Option<Option<String>> {
        let supplied = self.category.as_ref()?;
        match supplied.as_deref().map(str::trim) {
            None | Some("") => Some(None),
            Some(category) => v
                .optional("category", Some(category), Some(CATEGORY_MAX_LEN))
                .map(Some),
        }
    }

    pub fn into_new(self) -> Result<NewFlashcard, ApiError> {
        let mut v = Validator::new();
        let front = v.required("front", self.front.as_deref(), None);
        let back = v.required("back", self.back.as_deref(), None);
        let category = self.category(&mut v).flatten();
        v.finish()?;
        match (front, back) {
            (Some(front), Some(back)) => Ok(NewFlashcard {
                front,
                back,
                category,
            }),
            _ => Err(ApiError::invalid_field("front", REQUIRED)),
        }
    }

    pub fn into_changes(self) -> Result<FlashcardChanges, ApiError> {
        let mut v = Validator::new();
        let front = v.optional("front", self.front.as_deref(), None);
        let back = v.optional("back", self.back.as_deref(), None);
        let category = self.category(&mut v);
        v.finish()?;
        Ok(FlashcardChanges {
            front,
            back,
            category,
        })
    }
}
