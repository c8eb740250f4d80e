//! X25519 hybrid encryption
//!
//! ECIES over X25519: a fresh ephemeral key agrees a secret with the
//! recipient's static key, HKDF-SHA256 turns `ephemeral_public ‖ shared` into
//! an XChaCha20-Poly1305 key (with `context_info` as HKDF info), and the
//! plaintext is sealed under it.
//!
//! Output: `ephemeral_public (32) ‖ nonce (24) ‖ ciphertext ‖ tag (16)`.

use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::{
    aead::{
        POLY1305_TAG_SIZE, XCHACHA20_NONCE_SIZE, XCHACHA20_POLY1305_KEY_SIZE, XChaCha20Poly1305Key,
    },
    error::CryptoError,
    prf::HkdfSha256Prf,
};

/// X25519 private and public key size (32 bytes)
pub const X25519_KEY_SIZE: usize = 32;

/// Bytes added to the plaintext by [`X25519PublicKey::seal`]
pub const X25519_HYBRID_OVERHEAD: usize =
    X25519_KEY_SIZE + XCHACHA20_NONCE_SIZE + POLY1305_TAG_SIZE;

/// X25519 private key of a hybrid encryption recipient.
///
/// The inner secret zeroizes itself on drop.
pub struct X25519PrivateKey {
    secret: StaticSecret,
}

impl X25519PrivateKey {
    /// Parse a 32-byte private scalar.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: not [`X25519_KEY_SIZE`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut scalar = to_array(bytes)?;
        let secret = StaticSecret::from(scalar);
        scalar.zeroize();
        Ok(Self { secret })
    }

    /// Public half of this key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey { key: PublicKey::from(&self.secret) }
    }

    /// Decrypt a message produced by [`X25519PublicKey::seal`].
    ///
    /// # Errors
    ///
    /// - `CiphertextTooShort`: shorter than [`X25519_HYBRID_OVERHEAD`]
    /// - `InvalidPublicKey`: the ephemeral key is a low-order point
    /// - `AuthenticationFailed`: wrong key, wrong `context_info` or tampering
    pub fn open(&self, sealed: &[u8], context_info: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < X25519_HYBRID_OVERHEAD {
            return Err(CryptoError::CiphertextTooShort {
                actual: sealed.len(),
                minimum: X25519_HYBRID_OVERHEAD,
            });
        }

        let (ephemeral_public, payload) = sealed.split_at(X25519_KEY_SIZE);
        let ephemeral_public = PublicKey::from(to_array(ephemeral_public)?);
        let shared = self.secret.diffie_hellman(&ephemeral_public);
        if !shared.was_contributory() {
            return Err(CryptoError::InvalidPublicKey);
        }

        let dem = dem_key(ephemeral_public.as_bytes(), shared.as_bytes(), context_info)?;
        dem.open(payload, &[])
    }
}

/// X25519 public key of a hybrid encryption recipient.
#[derive(Clone, PartialEq, Eq)]
pub struct X25519PublicKey {
    key: PublicKey,
}

impl X25519PublicKey {
    /// Parse a 32-byte public key. Every 32-byte string is a valid encoding.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: not [`X25519_KEY_SIZE`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self { key: PublicKey::from(to_array(bytes)?) })
    }

    /// Encoded key.
    pub fn to_bytes(&self) -> [u8; X25519_KEY_SIZE] {
        self.key.to_bytes()
    }

    /// Encrypt `plaintext` to this key, bound to `context_info`.
    ///
    /// # Errors
    ///
    /// - `InvalidPublicKey`: this key is a low-order point
    ///
    /// # Security
    ///
    /// - `ephemeral` and `nonce` MUST come from a cryptographically secure RNG
    ///   and never be reused
    pub fn seal(
        &self,
        plaintext: &[u8],
        context_info: &[u8],
        ephemeral: [u8; X25519_KEY_SIZE],
        nonce: [u8; XCHACHA20_NONCE_SIZE],
    ) -> Result<Vec<u8>, CryptoError> {
        let ephemeral = StaticSecret::from(ephemeral);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.key);
        if !shared.was_contributory() {
            return Err(CryptoError::InvalidPublicKey);
        }

        let dem = dem_key(ephemeral_public.as_bytes(), shared.as_bytes(), context_info)?;
        let sealed = dem.seal(plaintext, &[], nonce);

        let mut output = Vec::with_capacity(X25519_KEY_SIZE + sealed.len());
        output.extend_from_slice(ephemeral_public.as_bytes());
        output.extend_from_slice(&sealed);
        Ok(output)
    }
}

fn to_array(bytes: &[u8]) -> Result<[u8; X25519_KEY_SIZE], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: X25519_KEY_SIZE,
        actual: bytes.len(),
    })
}

fn dem_key(
    ephemeral_public: &[u8; X25519_KEY_SIZE],
    shared: &[u8; X25519_KEY_SIZE],
    context_info: &[u8],
) -> Result<XChaCha20Poly1305Key, CryptoError> {
    let mut ikm = [0u8; 2 * X25519_KEY_SIZE];
    ikm[..X25519_KEY_SIZE].copy_from_slice(ephemeral_public);
    ikm[X25519_KEY_SIZE..].copy_from_slice(shared);

    let prf = HkdfSha256Prf::new(&ikm, &[]);
    ikm.zeroize();
    let mut key_bytes = prf?.compute(context_info, XCHACHA20_POLY1305_KEY_SIZE)?;
    let key = XChaCha20Poly1305Key::new(&key_bytes);
    key_bytes.zeroize();
    key
}
