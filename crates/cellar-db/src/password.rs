//! Salted one-way credential hashing (argon2id, PHC string format).
//!
//! The raw password only ever exists in memory for the duration of a call;
//! the database stores the PHC string.
//!
//! argon2 is CPU-heavy; both operations run on tokio's blocking pool.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::warn;

use crate::error::{DbError, DbResult};

/// Plaintext behind the stand-in hash checked when no account matched.
const DUMMY_PASSWORD: &str = "cellar-no-such-account";

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hashes a password with a fresh random salt.
pub async fn hash_password(password: &str) -> DbResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| DbError::PasswordHash(e.to_string()))?
}

/// Checks a claimed password against a stored hash.
///
/// With no stored hash (no such account) the claim is still checked against
/// a stand-in hash of the same cost and the result is always `false`, so
/// both outcomes take one full argon2 verification.
///
/// A stored value that is not a valid PHC string never verifies.
pub async fn verify_password(password: &str, stored_hash: Option<&str>) -> bool {
    let password = password.to_owned();
    let stored = stored_hash.map(str::to_owned);
    let known = stored.is_some();

    let matched = tokio::task::spawn_blocking(move || {
        verify_blocking(&password, stored.as_deref().unwrap_or_else(|| dummy_hash()))
    })
    .await
    .unwrap_or(false);

    known && matched
}

fn hash_blocking(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

fn verify_blocking(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash checked in place of a missing account's, computed on first use.
fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| {
        hash_blocking(DUMMY_PASSWORD).unwrap_or_else(|e| {
            warn!(error = %e, "Could not compute stand-in credential hash");
            String::new()
        })
    })
}
