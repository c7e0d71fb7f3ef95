//! Password hashing with Argon2id.
//!
//! Staff credentials are stored as PHC-formatted Argon2id hashes. Parameters
//! follow the OWASP password storage guidance (19 MiB memory, 2 iterations,
//! single lane).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Stored hash is not a valid PHC string")]
    MalformedHash,
}

const MEMORY_COST_KIB: u32 = 19456;
const ITERATIONS: u32 = 2;
const LANES: u32 = 1;
const HASH_LEN: usize = 32;

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, LANES, Some(HASH_LEN))
        .map_err(|e| PasswordError::HashingFailed(format!("Invalid Argon2 params: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a plaintext password into a self-describing PHC string.
///
/// The returned string embeds algorithm, parameters and salt, so parameter
/// upgrades only affect newly stored hashes.
///
/// # Example
/// ```
/// use shared::password::hash_password;
///
/// let hash = hash_password("rotativa-2024").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Verifies a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` for a well-formed hash that does not match and an
/// error only when the stored hash itself is unusable.
///
/// # Example
/// ```
/// use shared::password::{hash_password, verify_password};
///
/// let hash = hash_password("offset-press").unwrap();
/// assert!(verify_password("offset-press", &hash).unwrap());
/// assert!(!verify_password("digital-press", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::MalformedHash)?;

    // The PHC string carries its own parameters; a default instance reads them.
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_formatted_with_expected_params() {
        let hash = hash_password("segredo").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let a = hash_password("mesma-senha").unwrap();
        let b = hash_password("mesma-senha").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_accepts_correct_password() {
        let hash = hash_password("Gr@fica123").unwrap();
        assert!(verify_password("Gr@fica123", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hash = hash_password("correta").unwrap();
        assert!(!verify_password("errada", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let result = verify_password("qualquer", "definitely-not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::MalformedHash)));
    }

    #[test]
    fn test_unicode_passwords_round_trip() {
        let password = "açaí-impressão-123";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("acai-impressao-123", &hash).unwrap());
    }

    #[test]
    fn test_empty_password_round_trips() {
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash).unwrap());
        assert!(!verify_password(" ", &hash).unwrap());
    }

    #[test]
    fn test_error_display() {
        let err = PasswordError::HashingFailed("boom".to_string());
        assert!(err.to_string().contains("boom"));
        assert!(PasswordError::MalformedHash.to_string().contains("PHC"));
    }
}
