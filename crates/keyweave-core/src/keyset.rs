//! Keyset data model.
//!
//! A [`Keyset`] is an ordered list of [`Key`]s plus a primary key id. Key ids
//! are unique within one keyset only. Serialized key material lives in
//! [`KeyData`] and can be read only with an explicit
//! [`InsecureSecretKeyAccess`] token; everything else in this crate passes it
//! straight to the owning key manager.
//!
//! # Invariants
//!
//! Checked by [`Keyset::validate`]:
//!
//! - The keyset is non-empty
//! - Exactly one key carries the primary id, and it is `Enabled`
//! - No key has `Unknown` status
//! - No enabled key has an `Unknown` output prefix type

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeysetError;

/// Key identifier, unique within its keyset.
pub type KeyId = u32;

/// Lifecycle status of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStatus {
    /// Usable for all operations
    Enabled,
    /// Kept in the keyset but never used
    Disabled,
    /// Key material erased
    Destroyed,
    /// Placeholder status of freshly derived keys
    Unknown,
}

/// Output-prefix discipline of a key.
///
/// Controls the identification prefix prepended to ciphertexts and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputPrefixType {
    /// No prefix
    Raw,
    /// `0x01 ‖ key_id` (big-endian)
    Tink,
    /// `0x00 ‖ key_id`; MACs are computed over `data ‖ 0x00`
    Legacy,
    /// `0x00 ‖ key_id`
    Crunchy,
    /// Placeholder of freshly derived keys; has no prefix
    Unknown,
}

/// Marker required to read secret key material.
///
/// Having to name this type at the call site keeps raw key access visible in
/// code review.
#[derive(Debug, Clone, Copy)]
pub struct InsecureSecretKeyAccess;

/// Type URL plus serialized key material.
///
/// The material is zeroized on drop and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyData {
    type_url: String,
    value: Vec<u8>,
}

impl KeyData {
    /// Wrap serialized key material for `type_url`.
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self { type_url: type_url.into(), value }
    }

    /// Type URL selecting the key manager.
    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    /// Serialized key material.
    pub fn value(&self, _access: InsecureSecretKeyAccess) -> &[u8] {
        &self.value
    }

    pub(crate) fn material(&self) -> &[u8] {
        &self.value
    }
}

impl fmt::Debug for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyData")
            .field("type_url", &self.type_url)
            .field("value", &format_args!("<{} bytes redacted>", self.value.len()))
            .finish()
    }
}

/// One keyset entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Type URL and serialized material
    pub key_data: KeyData,
    /// Identifier within the keyset
    pub key_id: KeyId,
    /// Lifecycle status
    pub status: KeyStatus,
    /// Prefix discipline
    pub output_prefix_type: OutputPrefixType,
}

/// Ordered keys with a designated primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyset {
    /// Id of the primary key
    pub primary_key_id: KeyId,
    /// Keys in keyset order
    pub keys: Vec<Key>,
}

impl Keyset {
    /// Check the structural invariants listed in the module docs.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyset`: any invariant is violated
    pub fn validate(&self) -> Result<(), KeysetError> {
        if self.keys.is_empty() {
            return Err(invalid("keyset has no keys".to_string()));
        }

        let mut primaries = 0;
        for key in &self.keys {
            if key.status == KeyStatus::Unknown {
                return Err(invalid(format!("key {} has unknown status", key.key_id)));
            }
            if key.status == KeyStatus::Enabled
                && key.output_prefix_type == OutputPrefixType::Unknown
            {
                return Err(invalid(format!("key {} has unknown output prefix type", key.key_id)));
            }
            if key.key_id == self.primary_key_id {
                if key.status != KeyStatus::Enabled {
                    return Err(invalid(format!("primary key {} is not enabled", key.key_id)));
                }
                primaries += 1;
            }
        }

        match primaries {
            1 => Ok(()),
            0 => Err(invalid(format!("primary key {} not found", self.primary_key_id))),
            _ => Err(invalid(format!("primary key id {} is not unique", self.primary_key_id))),
        }
    }

    /// Metadata of every key, without material.
    pub fn info(&self) -> KeysetInfo {
        KeysetInfo {
            primary_key_id: self.primary_key_id,
            key_info: self
                .keys
                .iter()
                .map(|key| KeyInfo {
                    type_url: key.key_data.type_url().to_string(),
                    key_id: key.key_id,
                    status: key.status,
                    output_prefix_type: key.output_prefix_type,
                })
                .collect(),
        }
    }
}

fn invalid(reason: String) -> KeysetError {
    KeysetError::InvalidKeyset { reason }
}

/// Metadata-only view of a keyset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetInfo {
    /// Id of the primary key
    pub primary_key_id: KeyId,
    /// Per-key metadata in keyset order
    pub key_info: Vec<KeyInfo>,
}

/// Metadata of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Type URL
    pub type_url: String,
    /// Key id
    pub key_id: KeyId,
    /// Lifecycle status
    pub status: KeyStatus,
    /// Prefix discipline
    pub output_prefix_type: OutputPrefixType,
}

/// Recipe for generating (or deriving) a key.
///
/// `value` holds serialized parameters understood by the manager for
/// `type_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTemplate {
    /// Type URL of the key to create
    pub type_url: String,
    /// Serialized key parameters
    pub value: Vec<u8>,
    /// Prefix discipline for the new key
    pub output_prefix_type: OutputPrefixType,
}
