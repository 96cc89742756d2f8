use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ApiError, FieldErrors};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Required text: present, not blank, at most `max_len` characters.
    /// Returns the trimmed value when valid.
    pub fn required(
        &mut self,
        field: &str,
        value: Option<&str>,
        max_len: Option<usize>,
    ) -> Option<String> {
        match value {
            None => {
                self.error(field, REQUIRED);
                None
            }
            Some(v) => self.supplied(field, v, max_len),
        }
    }

    /// Optional on input, but when supplied it must satisfy the same rules as
    /// [`Validator::required`].
    pub fn optional(
        &mut self,
        field: &str,
        value: Option<&str>,
        max_len: Option<usize>,
    ) -> Option<String> {
        value.and_then(|v| self.supplied(field, v, max_len))
    }

    fn supplied(&mut self, field: &str, value: &str, max_len: Option<usize>) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.error(field, BLANK);
            return None;
        }
        if let Some(max) = max_len {
            if trimmed.chars().count() > max {
                self.error(
                    field,
                    format!("Ensure this field has no more than {max} characters."),
                );
                return None;
            }
        }
        Some(trimmed.to_string())
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}
