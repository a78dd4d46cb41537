//! Salted PBKDF2-HMAC-SHA256 credentials.
//!
//! Both halves are stored base64-encoded. The hash half encodes the lowercase
//! hex rendering of the derived key, which is what accounts created by the
//! upstream platform carry.

use base64::{engine::general_purpose::STANDARD, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const PBKDF2_ROUNDS: u32 = 10_000;
pub const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Stored form of a credential: `(hash, salt)`, both base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Hash `password` under a fresh random salt.
pub fn hash_password(password: &str) -> Result<HashedPassword, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooShort { min: MIN_PASSWORD_LENGTH });
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    Ok(HashedPassword {
        hash: encode_hash(&derive(password, &salt)),
        salt: STANDARD.encode(salt),
    })
}

/// Re-derive from `password` and the stored salt and compare with the stored hash.
pub fn verify_password(password: &str, stored_hash: &str, stored_salt: &str) -> Result<bool, AuthError> {
    let expected = STANDARD.decode(stored_hash)?;
    let salt = STANDARD.decode(stored_salt)?;
    let actual = hex::encode(derive(password, &salt));
    Ok(constant_time_eq(actual.as_bytes(), &expected))
}

fn derive(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

fn encode_hash(key: &[u8]) -> String {
    STANDARD.encode(hex::encode(key))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
