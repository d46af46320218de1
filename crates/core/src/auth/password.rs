//! Password storage for family members.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$...`) with a fresh
//! random salt each. Hashes of any other algorithm are treated as corrupt.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, SaltString};
use argon2::{ARGON2ID_IDENT, Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use thiserror::Error;

/// Errors from hashing or checking a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The hasher itself failed.
    #[error("password hashing failed: {0}")]
    Hashing(password_hash::Error),

    /// The stored hash is not an Argon2id PHC string.
    #[error("stored password hash is not a valid argon2id hash")]
    MalformedHash,
}

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hashes `password` for storage in `users.password_hash`.
///
/// # Errors
///
/// Returns `PasswordError::Hashing` if Argon2 rejects the input.
///
/// # Example
///
/// ```
/// use famledger_core::auth::hash_password;
///
/// let hash = hash_password("family-budget-2024").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hashing)?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored hash.
///
/// A wrong password is `Ok(false)`, not an error.
///
/// # Errors
///
/// Returns `PasswordError::MalformedHash` when `stored` cannot be parsed or
/// is not Argon2id, and `PasswordError::Hashing` for other verifier failures.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(|_| PasswordError::MalformedHash)?;
    if parsed.algorithm != ARGON2ID_IDENT {
        return Err(PasswordError::MalformedHash);
    }

    match parsed.verify_password(&[&hasher()], password) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::Hashing(err)),
    }
}
