//! Frames and digests for the connection handshake.
//!
//! A server configured with a secret opens every connection with a
//! [`Handshake::Challenge`] carrying a fresh nonce. The client proves it knows
//! the secret by answering with the SHA-256 digest of the nonce followed by
//! the secret; the secret itself never crosses the wire.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tether_config::Secret;

/// Random bytes drawn for every challenge.
const NONCE_BYTES: usize = 32;

/// Handshake frames exchanged before the first request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Handshake {
    /// Server requires proof of the shared secret.
    Challenge {
        /// Single-use value mixed into the digest.
        nonce: String,
    },
    /// Server accepts clients without a secret.
    Open,
    /// Client's proof of the secret.
    Answer {
        /// Hex SHA-256 digest of `nonce || secret`.
        digest: String,
    },
    /// Server accepted the answer.
    Accepted,
    /// Server rejected the answer and is about to drop the connection.
    Rejected,
}

/// Computes the answer to a challenge.
#[must_use]
pub fn digest(nonce: &str, secret: &Secret) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks an answer against the expected digest without short-circuiting.
#[must_use]
pub fn verify_digest(nonce: &str, secret: &Secret, answer: &str) -> bool {
    let expected = digest(nonce, secret);
    if expected.len() != answer.len() {
        return false;
    }
    expected
        .bytes()
        .zip(answer.bytes())
        .fold(0_u8, |acc, (left, right)| acc | (left ^ right))
        == 0
}

/// Draws a fresh random nonce, hex encoded.
#[must_use]
pub fn generate_nonce() -> String {
    let bytes: [u8; NONCE_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secrets_verify() {
        let secret = Secret::from("abc");
        let nonce = generate_nonce();
        let answer = digest(&nonce, &secret);
        assert!(verify_digest(&nonce, &secret, &answer));
    }

    #[test]
    fn mismatched_secrets_fail() {
        let nonce = generate_nonce();
        let answer = digest(&nonce, &Secret::from("xyz"));
        assert!(!verify_digest(&nonce, &Secret::from("abc"), &answer));
    }

    #[test]
    fn nonces_do_not_repeat() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), NONCE_BYTES * 2);
        assert_ne!(nonce, generate_nonce());
    }

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        let answer = digest("nonce", &Secret::from("abc"));
        assert_eq!(answer.len(), 64);
        assert!(answer.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn frames_are_tagged_by_kind() {
        let encoded = serde_json::to_string(&Handshake::Open).expect("encode");
        assert_eq!(encoded, r#"{"kind":"open"}"#);
    }
}
