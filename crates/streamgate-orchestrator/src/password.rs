//! Credential password generation and Argon2id hashing.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::Rng;
use rand::distr::Alphanumeric;
use streamgate_core::error::StreamgateError;

/// Length of generated service-account passwords.
const PASSWORD_LENGTH: usize = 32;

/// Generate a random alphanumeric password.
pub fn generate_password() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a plaintext password with Argon2id (PHC string format).
pub fn hash_password(password: &str) -> Result<String, StreamgateError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| StreamgateError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or an error
/// if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, StreamgateError> {
    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| StreamgateError::Internal(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(StreamgateError::Internal(format!("verify error: {e}"))),
    }
}
