use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password does not match.")]
    Mismatch,

    /// The stored hash could not be parsed or the hasher failed; never the caller's fault.
    #[error("Password hashing failed: {0}")]
    Hashing(password_hash::Error),
}

impl From<password_hash::Error> for PasswordError {
    fn from(err: password_hash::Error) -> Self {
        match err {
            password_hash::Error::Password => PasswordError::Mismatch,
            err => PasswordError::Hashing(err),
        }
    }
}

/// Argon2id hash in PHC string format, with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default().hash_password(plain.as_bytes(), &salt)?.to_string())
}

/// Checks `plain` against a PHC string produced by [`hash_password`].
pub fn verify_password(plain: &str, stored: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(stored)?;

    Ok(Argon2::default().verify_password(plain.as_bytes(), &parsed)?)
}
