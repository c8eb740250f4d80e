//! Ed25519 signatures

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Ed25519 private key seed size (32 bytes)
pub const ED25519_SEED_SIZE: usize = 32;

/// Ed25519 public key size (32 bytes)
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Ed25519 signature size (64 bytes)
pub const ED25519_SIGNATURE_SIZE: usize = 64;

/// Ed25519 signing key built from a 32-byte seed.
///
/// The inner key zeroizes itself on drop.
pub struct Ed25519SigningKey {
    key: SigningKey,
}

impl Ed25519SigningKey {
    /// Expand `seed` into a signing key.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: seed is not [`ED25519_SEED_SIZE`] bytes
    pub fn from_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        let mut bytes: [u8; ED25519_SEED_SIZE] = seed.try_into().map_err(|_| {
            CryptoError::InvalidKeyLength { expected: ED25519_SEED_SIZE, actual: seed.len() }
        })?;
        let key = SigningKey::from_bytes(&bytes);
        bytes.zeroize();
        Ok(Self { key })
    }

    /// Sign `data`. Ed25519 is deterministic: same key and data give the same
    /// signature.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.key.sign(data).to_bytes().to_vec()
    }

    /// Public half of this key.
    pub fn verifying_key(&self) -> Ed25519VerifyingKey {
        Ed25519VerifyingKey { key: self.key.verifying_key() }
    }
}

/// Ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct Ed25519VerifyingKey {
    key: VerifyingKey,
}

impl Ed25519VerifyingKey {
    /// Parse a compressed public key.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: not [`ED25519_PUBLIC_KEY_SIZE`] bytes
    /// - `InvalidPublicKey`: bytes are not a valid curve point
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; ED25519_PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyLength { expected: ED25519_PUBLIC_KEY_SIZE, actual: bytes.len() }
        })?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { key })
    }

    /// Compressed encoding.
    pub fn to_bytes(&self) -> [u8; ED25519_PUBLIC_KEY_SIZE] {
        self.key.to_bytes()
    }

    /// Verify `signature` over `data`.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature`: wrong length, malformed or not valid for `data`
    pub fn verify(&self, signature: &[u8], data: &[u8]) -> Result<(), CryptoError> {
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;
        self.key.verify(data, &signature).map_err(|_| CryptoError::InvalidSignature)
    }
}
