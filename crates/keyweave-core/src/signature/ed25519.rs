//! Ed25519 key managers.
//!
//! Serialized private key: CBOR `{ version, key_value, public_key }` where
//! `key_value` is the 32-byte seed.
//! Serialized public key: CBOR `{ version, key_value }`.
//! Serialized parameters: CBOR `{ version }`.

use std::sync::Arc;

use keyweave_crypto::{ED25519_SEED_SIZE, Ed25519SigningKey, Ed25519VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    codec,
    env::{Environment, SystemEnv},
    error::KeysetError,
    key_manager::{KeyManager, PrivateKeyManager},
    keyset::{KeyData, KeyTemplate, OutputPrefixType},
    primitive::{Primitive, PublicKeySign, PublicKeyVerify},
};

/// Type URL of Ed25519 private keys
pub const ED25519_PRIVATE_KEY_TYPE_URL: &str = "type.keyweave.dev/Ed25519PrivateKey";

/// Type URL of Ed25519 public keys
pub const ED25519_PUBLIC_KEY_TYPE_URL: &str = "type.keyweave.dev/Ed25519PublicKey";

const KEY_VERSION: u32 = 0;

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct Ed25519PrivateKeyMaterial {
    version: u32,
    key_value: Vec<u8>,
    public_key: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct Ed25519PublicKeyMaterial {
    version: u32,
    key_value: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct Ed25519Params {
    version: u32,
}

pub(super) fn template(output_prefix_type: OutputPrefixType) -> KeyTemplate {
    KeyTemplate {
        type_url: ED25519_PRIVATE_KEY_TYPE_URL.to_string(),
        value: codec::encode(&Ed25519Params { version: KEY_VERSION }),
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

fn invalid(err: keyweave_crypto::CryptoError) -> KeysetError {
    KeysetError::InvalidKeyMaterial { reason: err.to_string() }
}

/// Decode a private key and check that its stored public key matches the seed.
fn decode_private(serialized_key: &[u8]) -> Result<Ed25519SigningKey, KeysetError> {
    let material: Ed25519PrivateKeyMaterial = codec::decode(serialized_key, "Ed25519 key")?;
    check_version(material.version, "Ed25519 private key")?;

    let key = Ed25519SigningKey::from_seed(&material.key_value).map_err(invalid)?;
    if key.verifying_key().to_bytes().as_slice() != material.public_key.as_slice() {
        return Err(KeysetError::InvalidKeyMaterial {
            reason: "Ed25519 public key does not match the seed".to_string(),
        });
    }
    Ok(key)
}

/// Key manager for [`ED25519_PRIVATE_KEY_TYPE_URL`]. Produces signers.
#[derive(Debug, Clone, Default)]
pub struct Ed25519PrivateKeyManager<E: Environment = SystemEnv> {
    env: E,
}

impl<E: Environment> Ed25519PrivateKeyManager<E> {
    /// Manager drawing new seeds from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: Environment> KeyManager for Ed25519PrivateKeyManager<E> {
    fn type_url(&self) -> &str {
        ED25519_PRIVATE_KEY_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        let key = decode_private(serialized_key)?;
        Ok(Arc::new(Ed25519Signer { key }))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        let params: Ed25519Params = codec::decode(serialized_params, "Ed25519 params")?;
        check_version(params.version, "Ed25519 params")?;

        let mut seed = vec![0u8; ED25519_SEED_SIZE];
        self.env.random_bytes(&mut seed);
        let public_key = Ed25519SigningKey::from_seed(&seed).map_err(invalid)?.verifying_key();

        let material = Ed25519PrivateKeyMaterial {
            version: KEY_VERSION,
            key_value: seed,
            public_key: public_key.to_bytes().to_vec(),
        };
        Ok(KeyData::new(ED25519_PRIVATE_KEY_TYPE_URL, codec::encode(&material)))
    }
}

impl<E: Environment> PrivateKeyManager for Ed25519PrivateKeyManager<E> {
    fn public_key_data(&self, serialized_private_key: &[u8]) -> Result<KeyData, KeysetError> {
        let public_key = decode_private(serialized_private_key)?.verifying_key();
        let material = Ed25519PublicKeyMaterial {
            version: KEY_VERSION,
            key_value: public_key.to_bytes().to_vec(),
        };
        Ok(KeyData::new(ED25519_PUBLIC_KEY_TYPE_URL, codec::encode(&material)))
    }
}

/// Key manager for [`ED25519_PUBLIC_KEY_TYPE_URL`]. Produces verifiers.
///
/// Public keys come from a private keyset, never from a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519PublicKeyManager;

impl KeyManager for Ed25519PublicKeyManager {
    fn type_url(&self) -> &str {
        ED25519_PUBLIC_KEY_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        let material: Ed25519PublicKeyMaterial =
            codec::decode(serialized_key, "Ed25519 public key")?;
        check_version(material.version, "Ed25519 public key")?;

        let key = Ed25519VerifyingKey::from_bytes(&material.key_value).map_err(invalid)?;
        Ok(Arc::new(Ed25519Verifier { key }))
    }

    fn new_key_data(&self, _serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        Err(KeysetError::InvalidTemplate {
            reason: "Ed25519 public keys are derived from private keys".to_string(),
        })
    }
}

struct Ed25519Signer {
    key: Ed25519SigningKey,
}

impl PublicKeySign for Ed25519Signer {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        Ok(self.key.sign(data))
    }
}

impl Primitive for Ed25519Signer {
    fn into_public_key_sign(self: Arc<Self>) -> Option<Arc<dyn PublicKeySign>> {
        Some(self)
    }
}

struct Ed25519Verifier {
    key: Ed25519VerifyingKey,
}

impl PublicKeyVerify for Ed25519Verifier {
    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<(), KeysetError> {
        Ok(self.key.verify(signature, data)?)
    }
}

impl Primitive for Ed25519Verifier {
    fn into_public_key_verify(self: Arc<Self>) -> Option<Arc<dyn PublicKeyVerify>> {
        Some(self)
    }
}
