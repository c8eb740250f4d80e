//! HMAC-SHA256 key manager.
//!
//! Serialized key: CBOR `{ version, tag_size, key_value }`.
//! Serialized parameters: CBOR `{ key_size, tag_size }`.

use std::{io::Read, sync::Arc};

use keyweave_crypto::{
    HmacSha256Key, MAX_HMAC_KEY_SIZE, MAX_TAG_SIZE, MIN_HMAC_KEY_SIZE, MIN_TAG_SIZE,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    codec,
    env::{Environment, SystemEnv},
    error::KeysetError,
    key_manager::{self, DerivableKeyManager, KeyManager},
    keyset::{KeyData, KeyTemplate, OutputPrefixType},
    primitive::{Mac, Primitive},
};

/// Type URL of HMAC keys
pub const HMAC_TYPE_URL: &str = "type.keyweave.dev/HmacKey";

const KEY_VERSION: u32 = 0;

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct HmacKeyMaterial {
    version: u32,
    tag_size: u32,
    key_value: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct HmacParams {
    key_size: u32,
    tag_size: u32,
}

impl HmacParams {
    fn decode(serialized: &[u8]) -> Result<Self, KeysetError> {
        let params: Self = codec::decode(serialized, "HMAC params")?;
        if !(MIN_HMAC_KEY_SIZE..=MAX_HMAC_KEY_SIZE).contains(&(params.key_size as usize)) {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("HMAC key size {} is out of range", params.key_size),
            });
        }
        if !(MIN_TAG_SIZE..=MAX_TAG_SIZE).contains(&(params.tag_size as usize)) {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("HMAC tag size {} is out of range", params.tag_size),
            });
        }
        Ok(params)
    }
}

pub(super) fn template(
    key_size: u32,
    tag_size: u32,
    output_prefix_type: OutputPrefixType,
) -> KeyTemplate {
    KeyTemplate {
        type_url: HMAC_TYPE_URL.to_string(),
        value: codec::encode(&HmacParams { key_size, tag_size }),
        output_prefix_type,
    }
}

fn key_data(tag_size: u32, key_value: Vec<u8>) -> KeyData {
    let material = HmacKeyMaterial { version: KEY_VERSION, tag_size, key_value };
    KeyData::new(HMAC_TYPE_URL, codec::encode(&material))
}

/// Key manager for [`HMAC_TYPE_URL`].
#[derive(Debug, Clone, Default)]
pub struct HmacKeyManager<E: Environment = SystemEnv> {
    env: E,
}

impl<E: Environment> HmacKeyManager<E> {
    /// Manager drawing new key material from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: Environment> KeyManager for HmacKeyManager<E> {
    fn type_url(&self) -> &str {
        HMAC_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        let material: HmacKeyMaterial = codec::decode(serialized_key, "HMAC key")?;
        if material.version != KEY_VERSION {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("unsupported HMAC key version {}", material.version),
            });
        }

        let key = HmacSha256Key::new(&material.key_value, material.tag_size as usize)
            .map_err(|e| KeysetError::InvalidKeyMaterial { reason: e.to_string() })?;
        Ok(Arc::new(HmacSha256Mac { key }))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        let params = HmacParams::decode(serialized_params)?;

        let mut key_value = vec![0u8; params.key_size as usize];
        self.env.random_bytes(&mut key_value);
        Ok(key_data(params.tag_size, key_value))
    }
}

impl<E: Environment> DerivableKeyManager for HmacKeyManager<E> {
    fn derive_key(
        &self,
        serialized_params: &[u8],
        randomness: &mut dyn Read,
    ) -> Result<KeyData, KeysetError> {
        let params = HmacParams::decode(serialized_params)?;

        let key_value = key_manager::read_randomness(randomness, params.key_size as usize)?;
        Ok(key_data(params.tag_size, key_value))
    }
}

struct HmacSha256Mac {
    key: HmacSha256Key,
}

impl Mac for HmacSha256Mac {
    fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        Ok(self.key.compute(data))
    }

    fn verify_mac(&self, tag: &[u8], data: &[u8]) -> Result<(), KeysetError> {
        Ok(self.key.verify(tag, data)?)
    }
}

impl Primitive for HmacSha256Mac {
    fn into_mac(self: Arc<Self>) -> Option<Arc<dyn Mac>> {
        Some(self)
    }
}
