//! Dummy key managers.
//!
//! Key material is a human-readable name. [`DummyAead`] tags its ciphertext
//! with that name, and [`DummyDeriver`] embeds its name and the salt in every
//! key it derives, so the path an operation took is visible in its output.

use std::sync::Arc;

use keyweave_core::{
    Aead, Key, KeyData, KeyManager, KeyStatus, Keyset, KeysetDeriver, KeysetError, KeysetHandle,
    OutputPrefixType, Primitive,
};

/// Type URL of [`DummyAeadKeyManager`] keys
pub const DUMMY_AEAD_TYPE_URL: &str = "type.keyweave.test/DummyAead";

/// Type URL of [`DummyDeriverKeyManager`] keys
pub const DUMMY_DERIVER_TYPE_URL: &str = "type.keyweave.test/DummyDeriver";

fn name_from(material: &[u8]) -> Result<String, KeysetError> {
    match std::str::from_utf8(material) {
        Ok(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(KeysetError::InvalidKeyMaterial {
            reason: "dummy key material must be a non-empty UTF-8 name".to_string(),
        }),
    }
}

/// Fake AEAD: ciphertext is `len(name) ‖ name ‖ plaintext`.
///
/// Decryption succeeds only for ciphertext tagged with the same name, so
/// tests can tell which key decrypted without real cryptography.
#[derive(Debug, Clone)]
pub struct DummyAead {
    name: String,
}

impl DummyAead {
    /// AEAD tagging its output with `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn tag(&self) -> Vec<u8> {
        let mut tag = Vec::with_capacity(self.name.len() + 1);
        tag.push(self.name.len() as u8);
        tag.extend_from_slice(self.name.as_bytes());
        tag
    }
}

impl Aead for DummyAead {
    fn encrypt(&self, plaintext: &[u8], _associated_data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        let mut ciphertext = self.tag();
        ciphertext.extend_from_slice(plaintext);
        Ok(ciphertext)
    }

    fn decrypt(&self, ciphertext: &[u8], _associated_data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        ciphertext
            .strip_prefix(self.tag().as_slice())
            .map(<[u8]>::to_vec)
            .ok_or(KeysetError::OperationFailed { operation: "decrypt" })
    }
}

impl Primitive for DummyAead {
    fn into_aead(self: Arc<Self>) -> Option<Arc<dyn Aead>> {
        Some(self)
    }
}

/// Manager for [`DummyAead`]. Key parameters are the name itself.
///
/// Not derivable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyAeadKeyManager;

impl KeyManager for DummyAeadKeyManager {
    fn type_url(&self) -> &str {
        DUMMY_AEAD_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        Ok(Arc::new(DummyAead::new(name_from(serialized_key)?)))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        name_from(serialized_params)?;
        Ok(KeyData::new(DUMMY_AEAD_TYPE_URL, serialized_params.to_vec()))
    }
}

/// Fake deriver.
///
/// Each derived key is a [`DUMMY_AEAD_TYPE_URL`] key named
/// `"{len(name)}:{name}{salt}"`, so the derived keyset can be wrapped as an
/// AEAD and inspected.
#[derive(Debug, Clone)]
pub struct DummyDeriver {
    name: String,
    keys_per_derivation: usize,
}

impl DummyDeriver {
    /// Name a derived key gets for `salt`.
    pub fn derived_name(name: &str, salt: &[u8]) -> String {
        format!("{}:{}{}", name.len(), name, String::from_utf8_lossy(salt))
    }
}

impl KeysetDeriver for DummyDeriver {
    fn derive_keyset(&self, salt: &[u8]) -> Result<KeysetHandle, KeysetError> {
        let material = Self::derived_name(&self.name, salt).into_bytes();
        let keys = (1..=self.keys_per_derivation as u32)
            .map(|key_id| Key {
                key_data: KeyData::new(DUMMY_AEAD_TYPE_URL, material.clone()),
                key_id,
                status: KeyStatus::Enabled,
                output_prefix_type: OutputPrefixType::Raw,
            })
            .collect();

        KeysetHandle::new(Keyset { primary_key_id: 1, keys })
    }
}

impl Primitive for DummyDeriver {
    fn into_keyset_deriver(self: Arc<Self>) -> Option<Arc<dyn KeysetDeriver>> {
        Some(self)
    }
}

/// Manager for [`DummyDeriver`]. Key parameters are the deriver's name.
#[derive(Debug, Clone, Copy)]
pub struct DummyDeriverKeyManager {
    keys_per_derivation: usize,
}

impl DummyDeriverKeyManager {
    /// Derivers producing one key per derivation.
    pub fn new() -> Self {
        Self { keys_per_derivation: 1 }
    }

    /// Derivers producing `count` keys per derivation, for exercising
    /// malformed derivation output.
    pub fn with_keys_per_derivation(count: usize) -> Self {
        Self { keys_per_derivation: count }
    }
}

impl Default for DummyDeriverKeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyManager for DummyDeriverKeyManager {
    fn type_url(&self) -> &str {
        DUMMY_DERIVER_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        Ok(Arc::new(DummyDeriver {
            name: name_from(serialized_key)?,
            keys_per_derivation: self.keys_per_derivation,
        }))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        name_from(serialized_params)?;
        Ok(KeyData::new(DUMMY_DERIVER_TYPE_URL, serialized_params.to_vec()))
    }
}
