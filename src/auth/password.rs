use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::validation::BLANK;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Problem with a proposed password, if any. Whitespace-only counts as blank.
pub fn password_problem(plain: &str) -> Option<String> {
    if plain.trim().is_empty() {
        return Some(BLANK.to_string());
    }
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!(
            "Ensure this field has at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    None
}

/// Argon2id PHC string with a fresh salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` for a wrong password. A stored hash that does not parse is an
/// error, not a mismatch.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("verify password: {e}")),
    }
}
