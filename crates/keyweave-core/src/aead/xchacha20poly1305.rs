//! `XChaCha20-Poly1305` key manager.
//!
//! Serialized key: CBOR `{ version, key_value }` with a 32-byte key.
//! Serialized parameters: CBOR `{ version }`.
//! Ciphertext: `nonce (24) ‖ ciphertext ‖ tag (16)` with a fresh random nonce
//! per message.

use std::{io::Read, sync::Arc};

use keyweave_crypto::{XCHACHA20_NONCE_SIZE, XCHACHA20_POLY1305_KEY_SIZE, XChaCha20Poly1305Key};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    codec,
    env::{Environment, SystemEnv},
    error::KeysetError,
    key_manager::{self, DerivableKeyManager, KeyManager},
    keyset::{KeyData, KeyTemplate, OutputPrefixType},
    primitive::{Aead, Primitive},
};

/// Type URL of `XChaCha20-Poly1305` keys
pub const XCHACHA20_POLY1305_TYPE_URL: &str = "type.keyweave.dev/XChaCha20Poly1305Key";

const KEY_VERSION: u32 = 0;

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct XChaCha20Poly1305KeyMaterial {
    version: u32,
    key_value: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct XChaCha20Poly1305Params {
    version: u32,
}

pub(super) fn template(output_prefix_type: OutputPrefixType) -> KeyTemplate {
    KeyTemplate {
        type_url: XCHACHA20_POLY1305_TYPE_URL.to_string(),
        value: codec::encode(&XChaCha20Poly1305Params { version: KEY_VERSION }),
        output_prefix_type,
    }
}

/// Key manager for [`XCHACHA20_POLY1305_TYPE_URL`].
///
/// `env` supplies new key material and per-message nonces.
#[derive(Debug, Clone, Default)]
pub struct XChaCha20Poly1305KeyManager<E: Environment = SystemEnv> {
    env: E,
}

impl<E: Environment> XChaCha20Poly1305KeyManager<E> {
    /// Manager drawing randomness from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    fn key_data(key_value: Vec<u8>) -> KeyData {
        let material = XChaCha20Poly1305KeyMaterial { version: KEY_VERSION, key_value };
        KeyData::new(XCHACHA20_POLY1305_TYPE_URL, codec::encode(&material))
    }
}

fn check_params(serialized_params: &[u8]) -> Result<(), KeysetError> {
    let params: XChaCha20Poly1305Params =
        codec::decode(serialized_params, "XChaCha20Poly1305 params")?;
    if params.version != KEY_VERSION {
        return Err(KeysetError::InvalidKeyMaterial {
            reason: format!("unsupported XChaCha20Poly1305 params version {}", params.version),
        });
    }
    Ok(())
}

impl<E: Environment> KeyManager for XChaCha20Poly1305KeyManager<E> {
    fn type_url(&self) -> &str {
        XCHACHA20_POLY1305_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        let material: XChaCha20Poly1305KeyMaterial =
            codec::decode(serialized_key, "XChaCha20Poly1305 key")?;
        if material.version != KEY_VERSION {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("unsupported XChaCha20Poly1305 key version {}", material.version),
            });
        }

        let key = XChaCha20Poly1305Key::new(&material.key_value)
            .map_err(|e| KeysetError::InvalidKeyMaterial { reason: e.to_string() })?;
        Ok(Arc::new(XChaCha20Poly1305Aead { key, env: self.env.clone() }))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        check_params(serialized_params)?;

        let mut key_value = vec![0u8; XCHACHA20_POLY1305_KEY_SIZE];
        self.env.random_bytes(&mut key_value);
        Ok(Self::key_data(key_value))
    }
}

impl<E: Environment> DerivableKeyManager for XChaCha20Poly1305KeyManager<E> {
    fn derive_key(
        &self,
        serialized_params: &[u8],
        randomness: &mut dyn Read,
    ) -> Result<KeyData, KeysetError> {
        check_params(serialized_params)?;

        let key_value = key_manager::read_randomness(randomness, XCHACHA20_POLY1305_KEY_SIZE)?;
        Ok(Self::key_data(key_value))
    }
}

/// Single-key `XChaCha20-Poly1305` primitive.
struct XChaCha20Poly1305Aead<E> {
    key: XChaCha20Poly1305Key,
    env: E,
}

impl<E: Environment> Aead for XChaCha20Poly1305Aead<E> {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        let mut nonce = [0u8; XCHACHA20_NONCE_SIZE];
        self.env.random_bytes(&mut nonce);
        Ok(self.key.seal(plaintext, associated_data, nonce))
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        Ok(self.key.open(ciphertext, associated_data)?)
    }
}

impl<E: Environment> Primitive for XChaCha20Poly1305Aead<E> {
    fn into_aead(self: Arc<Self>) -> Option<Arc<dyn Aead>> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> XChaCha20Poly1305KeyManager {
        XChaCha20Poly1305KeyManager::new(SystemEnv)
    }

    fn aead(key_data: &KeyData) -> Arc<dyn Aead> {
        manager().primitive(key_data.material()).unwrap().into_aead().unwrap()
    }

    #[test]
    fn generated_key_encrypts_and_decrypts() {
        let key_data = manager().new_key_data(&template(OutputPrefixType::Tink).value).unwrap();
        let aead = aead(&key_data);

        let ciphertext = aead.encrypt(b"plaintext", b"ad").unwrap();
        assert_eq!(aead.decrypt(&ciphertext, b"ad").unwrap(), b"plaintext");
    }

    #[test]
    fn each_encryption_uses_a_fresh_nonce() {
        let key_data = manager().new_key_data(&template(OutputPrefixType::Raw).value).unwrap();
        let aead = aead(&key_data);

        assert_ne!(aead.encrypt(b"same", b"").unwrap(), aead.encrypt(b"same", b"").unwrap());
    }

    #[test]
    fn derivation_reads_exactly_one_key() {
        let params = template(OutputPrefixType::Tink).value;
        let stream: Vec<u8> = (0..40).collect();

        let mut first: &[u8] = &stream;
        let derived = manager().derive_key(&params, &mut first).unwrap();
        assert_eq!(first.len(), 8);

        let mut again: &[u8] = &stream;
        assert_eq!(manager().derive_key(&params, &mut again).unwrap(), derived);
    }

    #[test]
    fn derivation_fails_on_short_stream() {
        let params = template(OutputPrefixType::Tink).value;
        let mut short: &[u8] = &[0u8; 31];

        assert!(matches!(
            manager().derive_key(&params, &mut short),
            Err(KeysetError::DerivationFailed { .. })
        ));
    }

    #[test]
    fn malformed_material_is_rejected() {
        assert!(matches!(
            manager().primitive(b"not cbor"),
            Err(KeysetError::InvalidKeyMaterial { .. })
        ));

        let short = XChaCha20Poly1305KeyMaterial { version: 0, key_value: vec![0; 16] };
        assert!(matches!(
            manager().primitive(&codec::encode(&short)),
            Err(KeysetError::InvalidKeyMaterial { .. })
        ));

        let future = XChaCha20Poly1305KeyMaterial { version: 1, key_value: vec![0; 32] };
        assert!(matches!(
            manager().primitive(&codec::encode(&future)),
            Err(KeysetError::InvalidKeyMaterial { .. })
        ));
    }
}
