use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::repo_types::{GroupChanges, NewGroup};
use crate::error::ApiError;
use crate::validation::Validator;

const NAME_MAX_LEN: usize = 100;

/// Body of `POST /groups` and `PUT /groups/:id`. Both fields are required on
/// create and optional on update.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GroupRequest {
    #[schema(max_length = 100, example = "Algorithms")]
    pub name: Option<String>,
    #[schema(example = "Weekly CS study")]
    pub description: Option<String>,
}

impl GroupRequest {
    pub fn into_new(self) -> Result<NewGroup, ApiError> {
        let mut v = Validator::new();
        let name = v.required("name", self.name.as_deref(), Some(NAME_MAX_LEN));
        let description = v.required("description", self.description.as_deref(), None);
        v.finish()?;
        match (name, description) {
            (Some(name), Some(description)) => Ok(NewGroup { name, description }),
            _ => Err(ApiError::invalid_field("name", crate::validation::REQUIRED)),
        }
    }

    /// Omitted fields stay `None`; any supplied field must be valid.
    pub fn into_changes(self) -> Result<GroupChanges, ApiError> {
        let mut v = Validator::new();
        let name = v.optional("name", self.name.as_deref(), Some(NAME_MAX_LEN));
        let description = v.optional("description", self.description.as_deref(), None);
        v.finish()?;
        Ok(GroupChanges { name, description })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    #[schema(value_type = String, example = "Joined group successfully")]
    pub message: &'static str,
}
