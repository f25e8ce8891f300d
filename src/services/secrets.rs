//! Encryption of third-party API keys at rest.
//!
//! Stored values use the envelope `enc:v1:<key_id>:<nonce>:<ciphertext>`
//! with URL-safe unpadded base64 parts. The key is SHA-256 of the server
//! secret, and `key_id` is a short fingerprint of that key so a value written
//! under another secret is reported as such instead of as corrupt.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

const ENVELOPE_PREFIX: &str = "enc:v1:";
const NONCE_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("Encrypted secret envelope is invalid")]
    InvalidEnvelope,

    #[error("Encrypted secret was written with key {0}, which is not configured")]
    UnknownKey(String),

    #[error("Failed to encrypt secret")]
    Encrypt,

    #[error("Failed to decrypt secret")]
    Decrypt,
}

#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; 32],
    key_id: String,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl SecretCipher {
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        let key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        let fingerprint = Sha256::digest(key);
        let key_id = fingerprint[..4]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();

        Self { key, key_id }
    }

    #[must_use]
    pub fn is_encrypted(value: &str) -> bool {
        value.starts_with(ENVELOPE_PREFIX)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecretError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
        let aead = ChaCha20Poly1305::new_from_slice(&self.key).map_err(|_| SecretError::Encrypt)?;
        let ciphertext = aead
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| SecretError::Encrypt)?;

        Ok(format!(
            "{ENVELOPE_PREFIX}{}:{}:{}",
            self.key_id,
            URL_SAFE_NO_PAD.encode(nonce_bytes),
            URL_SAFE_NO_PAD.encode(ciphertext)
        ))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String, SecretError> {
        let body = stored
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or(SecretError::InvalidEnvelope)?;

        let mut parts = body.split(':');
        let (Some(key_id), Some(nonce_b64), Some(ciphertext_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SecretError::InvalidEnvelope);
        };

        if key_id != self.key_id {
            return Err(SecretError::UnknownKey(key_id.to_string()));
        }

        let nonce = URL_SAFE_NO_PAD
            .decode(nonce_b64)
            .map_err(|_| SecretError::InvalidEnvelope)?;
        if nonce.len() != NONCE_LEN {
            return Err(SecretError::InvalidEnvelope);
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(ciphertext_b64)
            .map_err(|_| SecretError::InvalidEnvelope)?;

        let aead = ChaCha20Poly1305::new_from_slice(&self.key).map_err(|_| SecretError::Decrypt)?;
        let plaintext = aead
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| SecretError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| SecretError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypted_value_hides_plaintext_and_decrypts() {
        let cipher = SecretCipher::from_secret("server-secret");
        let stored = cipher.encrypt("sk-live-123456").unwrap();

        assert!(SecretCipher::is_encrypted(&stored));
        assert!(!stored.contains("sk-live-123456"));
        assert_eq!(cipher.decrypt(&stored).unwrap(), "sk-live-123456");
    }

    #[test]
    fn same_plaintext_gets_fresh_nonce() {
        let cipher = SecretCipher::from_secret("server-secret");
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn other_secret_cannot_decrypt() {
        let stored = SecretCipher::from_secret("one").encrypt("value").unwrap();
        let err = SecretCipher::from_secret("two").decrypt(&stored).unwrap_err();
        assert!(matches!(err, SecretError::UnknownKey(_)));
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let cipher = SecretCipher::from_secret("server-secret");
        let stored = cipher.encrypt("value").unwrap();
        let (head, tail) = stored.rsplit_once(':').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(tail).unwrap();
        bytes[0] ^= 0xff;
        let tampered = format!("{head}:{}", URL_SAFE_NO_PAD.encode(bytes));

        assert_eq!(cipher.decrypt(&tampered), Err(SecretError::Decrypt));
    }

    #[test]
    fn plain_values_are_not_envelopes() {
        let cipher = SecretCipher::from_secret("server-secret");
        assert!(!SecretCipher::is_encrypted("sk-abc"));
        assert_eq!(cipher.decrypt("sk-abc"), Err(SecretError::InvalidEnvelope));
        assert_eq!(cipher.decrypt("enc:v1:only"), Err(SecretError::InvalidEnvelope));
    }
}
