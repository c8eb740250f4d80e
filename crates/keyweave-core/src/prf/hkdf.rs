//! HKDF-SHA256 PRF key manager.
//!
//! Serialized key: CBOR `{ version, salt, key_value }`.
//! Serialized parameters: CBOR `{ key_size, salt }`.
//!
//! HKDF keys are not derivable: they are the source of derivation, never its
//! target.

use std::{io::Read, sync::Arc};

use keyweave_crypto::{HKDF_SHA256_MAX_OUTPUT, HkdfSha256Prf, MIN_HKDF_KEY_SIZE};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    codec,
    env::{Environment, SystemEnv},
    error::KeysetError,
    key_manager::KeyManager,
    keyset::{KeyData, KeyTemplate, OutputPrefixType},
    primitive::{Prf, Primitive, StreamingPrf},
};

/// Type URL of HKDF-SHA256 PRF keys
pub const HKDF_PRF_TYPE_URL: &str = "type.keyweave.dev/HkdfPrfKey";

const KEY_VERSION: u32 = 0;

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct HkdfPrfKeyMaterial {
    version: u32,
    salt: Vec<u8>,
    key_value: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct HkdfPrfParams {
    key_size: u32,
    salt: Vec<u8>,
}

pub(super) fn template(key_size: u32, salt: Vec<u8>) -> KeyTemplate {
    KeyTemplate {
        type_url: HKDF_PRF_TYPE_URL.to_string(),
        value: codec::encode(&HkdfPrfParams { key_size, salt }),
        output_prefix_type: OutputPrefixType::Raw,
    }
}

/// Key manager for [`HKDF_PRF_TYPE_URL`].
#[derive(Debug, Clone, Default)]
pub struct HkdfPrfKeyManager<E: Environment = SystemEnv> {
    env: E,
}

impl<E: Environment> HkdfPrfKeyManager<E> {
    /// Manager drawing new key material from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: Environment> KeyManager for HkdfPrfKeyManager<E> {
    fn type_url(&self) -> &str {
        HKDF_PRF_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        Ok(Arc::new(HkdfPrf::from_key_material(serialized_key)?))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        let params: HkdfPrfParams = codec::decode(serialized_params, "HKDF params")?;
        if !(MIN_HKDF_KEY_SIZE..=HKDF_SHA256_MAX_OUTPUT).contains(&(params.key_size as usize)) {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("HKDF key size {} is out of range", params.key_size),
            });
        }

        let mut key_value = vec![0u8; params.key_size as usize];
        self.env.random_bytes(&mut key_value);

        let material = HkdfPrfKeyMaterial { version: KEY_VERSION, salt: params.salt, key_value };
        Ok(KeyData::new(HKDF_PRF_TYPE_URL, codec::encode(&material)))
    }
}

/// HKDF-SHA256 primitive: fixed-length and streaming PRF.
pub(crate) struct HkdfPrf {
    prf: HkdfSha256Prf,
}

impl HkdfPrf {
    /// Parse serialized HKDF key material.
    pub(crate) fn from_key_material(serialized_key: &[u8]) -> Result<Self, KeysetError> {
        let material: HkdfPrfKeyMaterial = codec::decode(serialized_key, "HKDF key")?;
        if material.version != KEY_VERSION {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("unsupported HKDF key version {}", material.version),
            });
        }

        let prf = HkdfSha256Prf::new(&material.key_value, &material.salt)
            .map_err(|e| KeysetError::InvalidKeyMaterial { reason: e.to_string() })?;
        Ok(Self { prf })
    }
}

impl Prf for HkdfPrf {
    fn compute(&self, input: &[u8], output_len: usize) -> Result<Vec<u8>, KeysetError> {
        Ok(self.prf.compute(input, output_len)?)
    }
}

impl StreamingPrf for HkdfPrf {
    fn compute_stream(&self, input: &[u8]) -> Result<Box<dyn Read + Send>, KeysetError> {
        Ok(Box::new(self.prf.stream(input)))
    }
}

impl Primitive for HkdfPrf {
    fn into_prf(self: Arc<Self>) -> Option<Arc<dyn Prf>> {
        Some(self)
    }

    fn into_streaming_prf(self: Arc<Self>) -> Option<Arc<dyn StreamingPrf>> {
        Some(self)
    }
}
