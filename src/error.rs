use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Field name to the list of problems found with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const INVALID_INPUT: &str = "Invalid input";
const GENERIC_FAILURE: &str = "An error occurred while processing your request";

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable code such as `VALIDATION_ERROR`.
    #[schema(value_type = String, example = "NOT_FOUND")]
    pub error: &'static str,
    pub message: String,
    /// Present for validation failures only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub field_errors: Option<FieldErrors>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid input")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::UniqueViolation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Store(StoreError::UniqueViolation { .. }) => "VALIDATION_ERROR",
            ApiError::Store(_) | ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Client-facing body. Store and internal failures are logged here and
    /// reported without detail.
    pub fn body(&self) -> ErrorBody {
        let (message, field_errors) = match self {
            ApiError::Validation(field_errors) => {
                (INVALID_INPUT.to_string(), Some(field_errors.clone()))
            }
            ApiError::Store(StoreError::UniqueViolation { field }) => {
                let mut errors = FieldErrors::new();
                errors.insert(
                    field.to_string(),
                    vec![format!("A user with that {field} already exists.")],
                );
                (INVALID_INPUT.to_string(), Some(errors))
            }
            ApiError::Store(e) => {
                error!(error = %e, "store failure");
                (GENERIC_FAILURE.to_string(), None)
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal failure");
                (GENERIC_FAILURE.to_string(), None)
            }
            _ => (self.to_string(), None),
        };
        ErrorBody {
            error: self.error_code(),
            message,
            field_errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(_: QueryRejection) -> Self {
        ApiError::invalid_field("page", "A valid integer is required.")
    }
}

// Ids that do not parse address nothing.
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::not_found("Not found")
    }
}
