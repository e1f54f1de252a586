//! Cleartext token generation and one-way fingerprinting.
//!
//! A cleartext token looks like `CXI_h9XkP2...` — a fixed prefix followed by
//! 32 characters drawn uniformly from the 62-char alphanumeric alphabet.
//! Only the SHA-256 fingerprint of the cleartext is ever stored; the
//! cleartext itself leaves the process exactly once, at issuance.

use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Recognizable prefix for CodeXI personal access tokens.
pub const TOKEN_PREFIX: &str = "CXI_";

/// Random characters after the prefix.
pub const RANDOM_LEN: usize = 32;

/// How much of the cleartext is kept as a display prefix (e.g. `CXI_h9Xk`).
pub const DISPLAY_PREFIX_LEN: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a fresh cleartext token from the OS CSPRNG.
///
/// Output space is 62^32; collisions are negligible but the store's unique
/// fingerprint index is the authority — callers must handle a duplicate on
/// insert.
pub fn generate() -> String {
    let mut rng = OsRng;
    let mut token = String::with_capacity(TOKEN_PREFIX.len() + RANDOM_LEN);
    token.push_str(TOKEN_PREFIX);
    for _ in 0..RANDOM_LEN {
        let idx = rng.gen_range(0..ALPHABET.len());
        token.push(ALPHABET[idx] as char);
    }
    token
}

/// Lowercase-hex SHA-256 of the cleartext's UTF-8 bytes.
///
/// Deterministic and one-way; this is the only representation of a token
/// that is ever persisted or compared against.
pub fn fingerprint(cleartext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cleartext.as_bytes());
    hex::encode(hasher.finalize())
}

/// First few characters of the cleartext, safe to store and display.
pub fn display_prefix(cleartext: &str) -> String {
    cleartext.chars().take(DISPLAY_PREFIX_LEN).collect()
}
