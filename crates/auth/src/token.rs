//! Single-use secrets for invitation and intake links.
//!
//! The raw token only ever travels to the recipient; storage keeps the
//! SHA-256 digest, so a leaked table cannot be replayed.

use rand::Rng;
use sha2::{Digest, Sha256};

pub struct SecretToken {
    pub token: String,
    pub hash: String,
}

impl SecretToken {
    /// 32 random bytes, hex encoded.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let bytes: [u8; 32] = rng.gen();
        let token = hex::encode(bytes);
        let hash = hash_token(&token);
        Self { token, hash }
    }
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}
