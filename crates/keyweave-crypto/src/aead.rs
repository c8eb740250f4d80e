//! Authenticated encryption using `XChaCha20-Poly1305`
//!
//! All functions are pure - the nonce must be provided by the caller. The
//! sealed layout is `nonce ‖ ciphertext ‖ tag`, so a sealed message carries
//! everything needed to open it except the key and the associated data.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Size of an `XChaCha20-Poly1305` key (32 bytes)
pub const XCHACHA20_POLY1305_KEY_SIZE: usize = 32;

/// Size of the extended `XChaCha20` nonce (24 bytes)
pub const XCHACHA20_NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
pub const POLY1305_TAG_SIZE: usize = 16;

/// A single `XChaCha20-Poly1305` key.
///
/// The key is zeroized on drop. A 24-byte nonce is large enough to be drawn
/// at random for every message without tracking nonce state.
pub struct XChaCha20Poly1305Key {
    key: [u8; XCHACHA20_POLY1305_KEY_SIZE],
}

impl XChaCha20Poly1305Key {
    /// Build a key from exactly 32 bytes of key material.
    pub fn new(key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; XCHACHA20_POLY1305_KEY_SIZE] =
            key_bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: XCHACHA20_POLY1305_KEY_SIZE,
                actual: key_bytes.len(),
            })?;

        Ok(Self { key })
    }

    /// Encrypt `plaintext` bound to `associated_data`.
    ///
    /// Returns `nonce ‖ ciphertext ‖ tag`.
    ///
    /// # Security
    ///
    /// - Caller MUST never reuse a nonce with the same key; in production the
    ///   nonce comes from a cryptographically secure RNG
    /// - Associated data is authenticated but not encrypted
    pub fn seal(
        &self,
        plaintext: &[u8],
        associated_data: &[u8],
        nonce: [u8; XCHACHA20_NONCE_SIZE],
    ) -> Vec<u8> {
        let cipher = XChaCha20Poly1305::new((&self.key).into());
        let payload = Payload { msg: plaintext, aad: associated_data };

        let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), payload) else {
            unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
        };

        let mut sealed = Vec::with_capacity(XCHACHA20_NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        sealed
    }

    /// Decrypt a message produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// - `CiphertextTooShort`: input cannot hold a nonce and a tag
    /// - `AuthenticationFailed`: wrong key, tampered input or wrong associated
    ///   data
    pub fn open(&self, sealed: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let minimum = XCHACHA20_NONCE_SIZE + POLY1305_TAG_SIZE;
        if sealed.len() < minimum {
            return Err(CryptoError::CiphertextTooShort { actual: sealed.len(), minimum });
        }

        let (nonce, ciphertext) = sealed.split_at(XCHACHA20_NONCE_SIZE);
        let cipher = XChaCha20Poly1305::new((&self.key).into());
        let payload = Payload { msg: ciphertext, aad: associated_data };

        cipher
            .decrypt(XNonce::from_slice(nonce), payload)
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}

impl Drop for XChaCha20Poly1305Key {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> XChaCha20Poly1305Key {
        let mut key = [0u8; XCHACHA20_POLY1305_KEY_SIZE];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        XChaCha20Poly1305Key::new(&key).unwrap()
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key();
        let sealed = key.seal(b"Hello, World!", b"context", [0xAB; XCHACHA20_NONCE_SIZE]);
        let opened = key.open(&sealed, b"context").unwrap();

        assert_eq!(opened, b"Hello, World!");
    }

    #[test]
    fn seal_open_empty_message() {
        let key = test_key();
        let sealed = key.seal(b"", b"", [0x00; XCHACHA20_NONCE_SIZE]);

        assert_eq!(sealed.len(), XCHACHA20_NONCE_SIZE + POLY1305_TAG_SIZE);
        assert_eq!(key.open(&sealed, b"").unwrap(), b"");
    }

    #[test]
    fn sealed_layout_starts_with_nonce() {
        let key = test_key();
        let nonce = [0x42; XCHACHA20_NONCE_SIZE];
        let sealed = key.seal(b"test message", b"", nonce);

        assert_eq!(&sealed[..XCHACHA20_NONCE_SIZE], &nonce);
        assert_eq!(sealed.len(), XCHACHA20_NONCE_SIZE + 12 + POLY1305_TAG_SIZE);
    }

    #[test]
    fn different_nonces_produce_different_ciphertexts() {
        let key = test_key();
        let sealed1 = key.seal(b"test", b"", [0x00; XCHACHA20_NONCE_SIZE]);
        let sealed2 = key.seal(b"test", b"", [0xFF; XCHACHA20_NONCE_SIZE]);

        assert_ne!(sealed1[XCHACHA20_NONCE_SIZE..], sealed2[XCHACHA20_NONCE_SIZE..]);
    }

    #[test]
    fn wrong_key_fails_open() {
        let sealed = test_key().seal(b"secret message", b"", [0x00; XCHACHA20_NONCE_SIZE]);
        let wrong_key = XChaCha20Poly1305Key::new(&[0xFF; XCHACHA20_POLY1305_KEY_SIZE]).unwrap();

        assert_eq!(wrong_key.open(&sealed, b""), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn wrong_associated_data_fails_open() {
        let key = test_key();
        let sealed = key.seal(b"secret message", b"room-1", [0x00; XCHACHA20_NONCE_SIZE]);

        assert_eq!(key.open(&sealed, b"room-2"), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_open() {
        let key = test_key();
        let mut sealed = key.seal(b"original message", b"", [0x00; XCHACHA20_NONCE_SIZE]);
        sealed[XCHACHA20_NONCE_SIZE] ^= 0xFF;

        assert!(key.open(&sealed, b"").is_err());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let key = test_key();
        let result = key.open(&[0u8; 39], b"");

        assert_eq!(result, Err(CryptoError::CiphertextTooShort { actual: 39, minimum: 40 }));
    }

    #[test]
    fn rejects_wrong_key_length() {
        let result = XChaCha20Poly1305Key::new(&[0u8; 16]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 16 })
        ));
    }
}
