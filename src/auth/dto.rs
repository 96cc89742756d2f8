use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::password::password_problem;
use super::repo_types::PublicUser;
use crate::error::ApiError;
use crate::validation::{is_valid_email, is_valid_username, Validator, REQUIRED};

const USERNAME_MAX_LEN: usize = 150;

/// Request body for user registration.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(required = true, value_type = String, max_length = 150, example = "alice")]
    pub username: Option<String>,
    #[schema(required = true, value_type = String, example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(required = true, value_type = String, min_length = 8, format = Password)]
    pub password: Option<String>,
}

/// Registration input after validation.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, ApiError> {
        let mut v = Validator::new();

        let username = v.required("username", self.username.as_deref(), Some(USERNAME_MAX_LEN));
        if let Some(name) = &username {
            if !is_valid_username(name) {
                v.error(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }

        let email = v
            .required("email", self.email.as_deref(), None)
            .map(|e| e.to_lowercase());
        if let Some(email) = &email {
            if !is_valid_email(email) {
                v.error("email", "Enter a valid email address.");
            }
        }

        match self.password.as_deref().map(password_problem) {
            None => v.error("password", REQUIRED),
            Some(Some(problem)) => v.error("password", problem),
            Some(None) => {}
        }

        v.finish()?;
        match (username, email, self.password) {
            (Some(username), Some(email), Some(password)) => Ok(Registration {
                username,
                email,
                password,
            }),
            _ => Err(ApiError::invalid_field("username", REQUIRED)),
        }
    }
}

/// Request body for login.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(required = true, value_type = String)]
    pub username: Option<String>,
    #[schema(required = true, value_type = String, format = Password)]
    pub password: Option<String>,
}

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

impl LoginRequest {
    /// Incomplete credentials fail the same way wrong ones do.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let username = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let password = self.password.filter(|p| !p.is_empty());
        match (username, password) {
            (Some(username), Some(password)) => Ok((username.to_string(), password)),
            _ => Err(ApiError::unauthorized(INVALID_CREDENTIALS)),
        }
    }
}

/// Response returned after registration.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Response returned after login.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}
