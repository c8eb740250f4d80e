//! X25519 hybrid encryption key managers.
//!
//! Serialized private key: CBOR `{ version, key_value, public_key }` where
//! `key_value` is the 32-byte scalar.
//! Serialized public key: CBOR `{ version, key_value }`.
//! Serialized parameters: CBOR `{ version }`.
//! Ciphertext: `ephemeral_public (32) ‖ nonce (24) ‖ ciphertext ‖ tag (16)`.

use std::sync::Arc;

use keyweave_crypto::{
    CryptoError, X25519_KEY_SIZE, X25519PrivateKey, X25519PublicKey, XCHACHA20_NONCE_SIZE,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    codec,
    env::{Environment, SystemEnv},
    error::KeysetError,
    key_manager::{KeyManager, PrivateKeyManager},
    keyset::{KeyData, KeyTemplate, OutputPrefixType},
    primitive::{HybridDecrypt, HybridEncrypt, Primitive},
};

/// Type URL of X25519 hybrid private keys
pub const X25519_HYBRID_PRIVATE_KEY_TYPE_URL: &str =
    "type.keyweave.dev/X25519HkdfXChaCha20Poly1305PrivateKey";

/// Type URL of X25519 hybrid public keys
pub const X25519_HYBRID_PUBLIC_KEY_TYPE_URL: &str =
    "type.keyweave.dev/X25519HkdfXChaCha20Poly1305PublicKey";

const KEY_VERSION: u32 = 0;

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct X25519PrivateKeyMaterial {
    version: u32,
    key_value: Vec<u8>,
    public_key: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct X25519PublicKeyMaterial {
    version: u32,
    key_value: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct X25519Params {
    version: u32,
}

pub(super) fn template(output_prefix_type: OutputPrefixType) -> KeyTemplate {
    KeyTemplate {
        type_url: X25519_HYBRID_PRIVATE_KEY_TYPE_URL.to_string(),
        value: codec::encode(&X25519Params { version: KEY_VERSION }),
        output_prefix_type,
    }
}

fn check_version(version: u32, what: &str) -> Result<(), KeysetError> {
    if version == KEY_VERSION {
        Ok(())
    } else {
        Err(KeysetError::InvalidKeyMaterial {
            reason: format!("unsupported {what} version {version}"),
        })
    }
}

fn invalid(err: CryptoError) -> KeysetError {
    KeysetError::InvalidKeyMaterial { reason: err.to_string() }
}

fn decode_private(serialized_key: &[u8]) -> Result<X25519PrivateKey, KeysetError> {
    let material: X25519PrivateKeyMaterial = codec::decode(serialized_key, "X25519 key")?;
    check_version(material.version, "X25519 private key")?;

    let key = X25519PrivateKey::from_bytes(&material.key_value).map_err(invalid)?;
    if key.public_key().to_bytes().as_slice() != material.public_key.as_slice() {
        return Err(KeysetError::InvalidKeyMaterial {
            reason: "X25519 public key does not match the private key".to_string(),
        });
    }
    Ok(key)
}

/// Key manager for [`X25519_HYBRID_PRIVATE_KEY_TYPE_URL`]. Produces decrypters.
#[derive(Debug, Clone, Default)]
pub struct X25519HybridPrivateKeyManager<E: Environment = SystemEnv> {
    env: E,
}

impl<E: Environment> X25519HybridPrivateKeyManager<E> {
    /// Manager drawing new private keys from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: Environment> KeyManager for X25519HybridPrivateKeyManager<E> {
    fn type_url(&self) -> &str {
        X25519_HYBRID_PRIVATE_KEY_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        let key = decode_private(serialized_key)?;
        Ok(Arc::new(X25519Decrypter { key }))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        let params: X25519Params = codec::decode(serialized_params, "X25519 params")?;
        check_version(params.version, "X25519 params")?;

        let mut key_value = vec![0u8; X25519_KEY_SIZE];
        self.env.random_bytes(&mut key_value);
        let public_key = X25519PrivateKey::from_bytes(&key_value).map_err(invalid)?.public_key();

        let material = X25519PrivateKeyMaterial {
            version: KEY_VERSION,
            key_value,
            public_key: public_key.to_bytes().to_vec(),
        };
        Ok(KeyData::new(X25519_HYBRID_PRIVATE_KEY_TYPE_URL, codec::encode(&material)))
    }
}

impl<E: Environment> PrivateKeyManager for X25519HybridPrivateKeyManager<E> {
    fn public_key_data(&self, serialized_private_key: &[u8]) -> Result<KeyData, KeysetError> {
        let public_key = decode_private(serialized_private_key)?.public_key();
        let material = X25519PublicKeyMaterial {
            version: KEY_VERSION,
            key_value: public_key.to_bytes().to_vec(),
        };
        Ok(KeyData::new(X25519_HYBRID_PUBLIC_KEY_TYPE_URL, codec::encode(&material)))
    }
}

/// Key manager for [`X25519_HYBRID_PUBLIC_KEY_TYPE_URL`]. Produces encrypters.
///
/// `env` supplies the ephemeral key and nonce of every message.
#[derive(Debug, Clone, Default)]
pub struct X25519HybridPublicKeyManager<E: Environment = SystemEnv> {
    env: E,
}

impl<E: Environment> X25519HybridPublicKeyManager<E> {
    /// Manager drawing per-message randomness from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: Environment> KeyManager for X25519HybridPublicKeyManager<E> {
    fn type_url(&self) -> &str {
        X25519_HYBRID_PUBLIC_KEY_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        let material: X25519PublicKeyMaterial =
            codec::decode(serialized_key, "X25519 public key")?;
        check_version(material.version, "X25519 public key")?;

        let key = X25519PublicKey::from_bytes(&material.key_value).map_err(invalid)?;
        Ok(Arc::new(X25519Encrypter { key, env: self.env.clone() }))
    }

    fn new_key_data(&self, _serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        Err(KeysetError::InvalidTemplate {
            reason: "X25519 public keys are derived from private keys".to_string(),
        })
    }
}

struct X25519Encrypter<E> {
    key: X25519PublicKey,
    env: E,
}

impl<E: Environment> HybridEncrypt for X25519Encrypter<E> {
    fn encrypt(&self, plaintext: &[u8], context_info: &[u8]) -> Result<Vec<u8>, KeysetError> {
        let mut ephemeral = [0u8; X25519_KEY_SIZE];
        let mut nonce = [0u8; XCHACHA20_NONCE_SIZE];
        self.env.random_bytes(&mut ephemeral);
        self.env.random_bytes(&mut nonce);

        let sealed = self.key.seal(plaintext, context_info, ephemeral, nonce);
        ephemeral.zeroize();
        Ok(sealed?)
    }
}

impl<E: Environment> Primitive for X25519Encrypter<E> {
    fn into_hybrid_encrypt(self: Arc<Self>) -> Option<Arc<dyn HybridEncrypt>> {
        Some(self)
    }
}

struct X25519Decrypter {
    key: X25519PrivateKey,
}

impl HybridDecrypt for X25519Decrypter {
    fn decrypt(&self, ciphertext: &[u8], context_info: &[u8]) -> Result<Vec<u8>, KeysetError> {
        Ok(self.key.open(ciphertext, context_info)?)
    }
}

impl Primitive for X25519Decrypter {
    fn into_hybrid_decrypt(self: Arc<Self>) -> Option<Arc<dyn HybridDecrypt>> {
        Some(self)
    }
}
