//! Credential store: salted password hashing and verification
//!
//! Hashes are Argon2id PHC strings, so the salt travels with the hash and the
//! plaintext is never persisted. Verification recomputes the hash with the
//! stored salt and compares in constant time.

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

/// Argon2id hash with the default cost parameters that no password maps to.
/// Unknown users are verified against it so the hashing cost is still paid.
const DUMMY_HASH: &str = concat!(
    "$argon2id$v=19$m=19456,t=2,p=1",
    "$ZGlzYy1kdW1teS1zYWx0IQ",
    "$JWLRUW7OWSbF+5oe9w5JkE0F9/2bcWRcHvLNgpKl2NY"
);

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Verify a supplied password against a stored hash.
///
/// Accounts without a password (OAuth-only) and unknown users are passed as
/// `None`; a verification against a throwaway hash still runs so the caller
/// cannot be told apart by response time.
pub fn verify_password(supplied: &str, stored: Option<&str>) -> Result<bool> {
    let Some(stored) = stored else {
        check(supplied, DUMMY_HASH)?;
        return Ok(false);
    };

    check(supplied, stored)
}

fn check(supplied: &str, stored: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(supplied.as_bytes(), &parsed_hash)
        .is_ok())
}
