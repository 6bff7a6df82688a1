use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::{OsRng, RngCore};

use crate::error::{AuthError, Result};

/// Longest accepted plaintext, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

const PASSWORD_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

/// Hash a password using Argon2 with default parameters and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::PasswordTooLong(MAX_PASSWORD_BYTES));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::HashingError(e.to_string()))
}

/// Verify a password against a hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Random password drawn uniformly from a fixed charset using the OS RNG.
pub fn generate_password(length: usize) -> String {
    // Largest multiple of the charset size that fits in a byte; anything above is rejected.
    let zone = (u8::MAX as usize + 1) / PASSWORD_CHARSET.len() * PASSWORD_CHARSET.len();
    let mut password = String::with_capacity(length);
    let mut buf = [0u8; 1];

    while password.len() < length {
        OsRng.fill_bytes(&mut buf);
        let b = buf[0] as usize;
        if b < zone {
            password.push(PASSWORD_CHARSET[b % PASSWORD_CHARSET.len()] as char);
        }
    }

    password
}
