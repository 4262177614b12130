use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

pub const MINIMUM_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Violations name the first missing character class so responses can carry
/// field-level detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComplexityViolation {
    #[error("password must be at least {minimum} characters")]
    TooShort { minimum: usize },
    #[error("password must contain an uppercase letter")]
    MissingUppercase,
    #[error("password must contain a lowercase letter")]
    MissingLowercase,
    #[error("password must contain a digit")]
    MissingDigit,
    #[error("password must contain a symbol")]
    MissingSymbol,
}

pub fn validate_complexity(password: &str) -> Result<(), ComplexityViolation> {
    if password.chars().count() < MINIMUM_PASSWORD_LENGTH {
        return Err(ComplexityViolation::TooShort {
            minimum: MINIMUM_PASSWORD_LENGTH,
        });
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ComplexityViolation::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ComplexityViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ComplexityViolation::MissingDigit);
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return Err(ComplexityViolation::MissingSymbol);
    }
    Ok(())
}

/// Argon2id hash with a fresh random salt, serialized as a PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

/// A malformed stored hash reads as a mismatch rather than an error; login
/// answers stay uniform either way.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
