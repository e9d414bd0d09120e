//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings with a random 16-byte salt. Cost
//! parameters are fixed here; verification reads them back from the stored
//! hash, so raising them later does not break existing accounts.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::OnceLock;
use ticketgate_core::Result;

use crate::error::CredentialError;

/// Memory cost in KiB.
const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Number of passes.
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

fn hasher() -> Result<Argon2<'static>, CredentialError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None).map_err(|e| {
        CredentialError::Hashing {
            reason: e.to_string(),
        }
    })?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `plaintext` with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes).map_err(|e| CredentialError::Hashing {
        reason: e.to_string(),
    })?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hashing {
        reason: e.to_string(),
    })?;

    let phc = hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hashing {
            reason: e.to_string(),
        })?
        .to_string();
    Ok(phc)
}

/// Checks `plaintext` against a stored PHC hash.
///
/// # Errors
///
/// - `CredentialError::MalformedHash` if `password_hash` cannot be parsed
/// - `CredentialError::CredentialMismatch` if the password is wrong
pub fn verify_password(password_hash: &str, plaintext: &str) -> Result<(), CredentialError> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| CredentialError::MalformedHash {
        reason: e.to_string(),
    })?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => {
            Err(CredentialError::CredentialMismatch.into())
        }
        Err(e) => Err(CredentialError::MalformedHash {
            reason: e.to_string(),
        }
        .into()),
    }
}

/// Burns roughly the same time as a real verification.
///
/// Called when the user does not exist, so response timing does not reveal
/// which usernames are registered. The outcome is ignored.
pub fn verify_dummy(plaintext: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| hash_password("ticketgate-timing-equalizer").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(hash, plaintext);
    }
}
