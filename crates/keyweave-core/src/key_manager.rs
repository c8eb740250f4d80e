//! Key manager contract.
//!
//! A key manager owns one type URL. It is the only component that parses the
//! serialized key material of that type; the rest of the crate treats the
//! bytes as opaque.

use std::{io::Read, sync::Arc};

use crate::{error::KeysetError, keyset::KeyData, primitive::Primitive};

/// Factory turning serialized key material into a primitive.
pub trait KeyManager: Send + Sync + 'static {
    /// Type URL handled by this manager.
    fn type_url(&self) -> &str;

    /// Whether this manager handles `type_url`.
    fn does_support(&self, type_url: &str) -> bool {
        type_url == self.type_url()
    }

    /// Construct the primitive for one key.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyMaterial`: material is malformed or out of range
    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError>;

    /// Generate fresh key material from serialized key parameters.
    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError>;
}

/// Key manager that can also build key material from a randomness stream.
///
/// Implementations MUST be deterministic: the same parameters and the same
/// stream bytes always produce the same key material.
pub trait DerivableKeyManager: KeyManager {
    /// Derive key material, reading only as many bytes as the key needs.
    ///
    /// # Errors
    ///
    /// - `DerivationFailed`: the stream ended before enough bytes were read
    fn derive_key(
        &self,
        serialized_params: &[u8],
        randomness: &mut dyn Read,
    ) -> Result<KeyData, KeysetError>;
}

/// Key manager for private keys that have a public counterpart.
pub trait PrivateKeyManager: KeyManager {
    /// Public key data for one serialized private key. The result belongs to
    /// the matching public key type, never to this manager's type.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyMaterial`: the private key is malformed
    fn public_key_data(&self, serialized_private_key: &[u8]) -> Result<KeyData, KeysetError>;
}

/// Read exactly `len` bytes of derivation randomness.
pub(crate) fn read_randomness(
    randomness: &mut dyn Read,
    len: usize,
) -> Result<Vec<u8>, KeysetError> {
    let mut bytes = vec![0u8; len];
    randomness.read_exact(&mut bytes).map_err(|e| KeysetError::DerivationFailed {
        reason: format!("insufficient randomness for {len}-byte key: {e}"),
    })?;
    Ok(bytes)
}
